use rocket::serde::json::{json, Json, Value};
use rocket::serde::Serialize;
use rocket::{Request, State};

use crate::queues::Mediator;

/// Result of polling one of the buffers.
///
/// The player and the agent both treat `404` as "nothing pending yet" and
/// poll again. An empty body is what distinguishes
/// it from a genuine routing error, which goes through [`not_found`] and
/// always carries a JSON body.
#[derive(Responder)]
pub enum Polled {
    #[response(status = 200)]
    Ready(Json<Value>),
    #[response(status = 404)]
    Empty(()),
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StateQueued {
    len_state_queue: usize,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionQueued {
    action_queue: Vec<String>,
}

#[get("/")]
pub fn index() -> &'static str {
    "Hello, World!"
}

/*************************
 * Player -> agent route *
 *************************/

#[get("/state")]
pub fn get_state(mediator: &State<Mediator>) -> Polled {
    match mediator.pop_report() {
        Some(report) => {
            log::debug!("[MEDIATOR] Handing out a report");
            Polled::Ready(Json(report))
        }
        None => Polled::Empty(()),
    }
}

#[post("/state", data = "<report>")]
pub fn post_state(report: Json<Value>, mediator: &State<Mediator>) -> Json<StateQueued> {
    let len_state_queue = mediator.push_report(report.into_inner());
    log::debug!("[MEDIATOR] Report queued ({} pending)", len_state_queue);
    Json(StateQueued { len_state_queue })
}

/*************************
 * Agent -> player route *
 *************************/

/// Peek: tells the player whether any action is pending. The buffer is
/// left untouched.
#[get("/action/<action>")]
pub fn get_action(action: &str, mediator: &State<Mediator>) -> Polled {
    match mediator.peek_actions() {
        Some(len_action_queue) => Polled::Ready(Json(json!({
            "action": action,
            "len_action_queue": len_action_queue,
        }))),
        None => Polled::Empty(()),
    }
}

#[post("/action/<action>")]
pub fn post_action(action: &str, mediator: &State<Mediator>) -> Json<ActionQueued> {
    log::debug!("[MEDIATOR] Action {} posted", action);
    let action_queue = mediator.push_action(action.to_string());
    Json(ActionQueued { action_queue })
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Json<Value> {
    log::warn!("[MEDIATOR] No route for {} {}", req.method(), req.uri());
    Json(json!({
        "error": "no such route",
        "path": req.uri().path().to_string(),
    }))
}
