use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use antidote::Mutex;
use rocket::serde::json::Value;

/// Raw action identifier as received on `/action/<id>`. The mediator does not
/// interpret it; the player decides what the number means.
pub type ActionId = String;

/// Rendezvous buffers shared by the agent and the player.
///
/// The two buffers are not symmetric:
///  - the report buffer is a stack: POST pushes, GET pops the newest report;
///  - the action buffer is only ever peeked. GET tells the player that an
///    action is pending, it never removes one.
///
/// Each buffer has its own lock; there is no ordering between the two.
pub struct Mediator {
    actions: Mutex<VecDeque<ActionId>>,
    reports: Mutex<Vec<Value>>,
    /// 0 means unbounded.
    action_capacity: usize,

    actions_pushed: AtomicUsize,
    actions_evicted: AtomicUsize,
    reports_pushed: AtomicUsize,
    reports_popped: AtomicUsize,
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Mediator {
    pub fn new(action_capacity: usize) -> Self {
        Self {
            actions: Mutex::new(VecDeque::new()),
            reports: Mutex::new(Vec::new()),
            action_capacity,
            actions_pushed: AtomicUsize::new(0),
            actions_evicted: AtomicUsize::new(0),
            reports_pushed: AtomicUsize::new(0),
            reports_popped: AtomicUsize::new(0),
        }
    }

    /// Append an action and return a snapshot of the whole action buffer.
    /// If a capacity is configured, the oldest actions are evicted first.
    pub fn push_action(&self, action: ActionId) -> Vec<ActionId> {
        let mut actions = self.actions.lock();
        actions.push_back(action);
        self.actions_pushed.fetch_add(1, Ordering::Relaxed);

        if self.action_capacity > 0 {
            while actions.len() > self.action_capacity {
                actions.pop_front();
                self.actions_evicted.fetch_add(1, Ordering::Relaxed);
            }
        }
        actions.iter().cloned().collect()
    }

    /// Number of buffered actions, or `None` if nothing was ever posted
    /// (or everything was evicted). Does not consume anything.
    pub fn peek_actions(&self) -> Option<usize> {
        let actions = self.actions.lock();
        if actions.is_empty() {
            None
        } else {
            Some(actions.len())
        }
    }

    /// Append a report and return the new length of the report buffer.
    pub fn push_report(&self, report: Value) -> usize {
        let mut reports = self.reports.lock();
        reports.push(report);
        self.reports_pushed.fetch_add(1, Ordering::Relaxed);
        reports.len()
    }

    /// Remove and return the most recently pushed report.
    pub fn pop_report(&self) -> Option<Value> {
        let report = self.reports.lock().pop();
        if report.is_some() {
            self.reports_popped.fetch_add(1, Ordering::Relaxed);
        }
        report
    }

    pub fn statistics(&self) -> String {
        let num_actions = self.actions.lock().len();
        let num_reports = self.reports.lock().len();
        format!(
            "{} action(s) buffered ({} pushed, {} evicted); {} report(s) buffered ({} pushed, {} popped)",
            num_actions,
            self.actions_pushed.load(Ordering::Relaxed),
            self.actions_evicted.load(Ordering::Relaxed),
            num_reports,
            self.reports_pushed.load(Ordering::Relaxed),
            self.reports_popped.load(Ordering::Relaxed),
        )
    }
}
