use std::fmt;

/// Number of actions an agent may choose from in `step`. `Reset` is not one
/// of them; it is only ever sent by `reset`.
pub const NUM_LEGAL_ACTIONS: usize = 4;

/// Control decisions for the player, in ordinal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Stop downloading.
    Pause,
    /// Download the video that is currently playing.
    Current,
    /// Download the next video in the sliding window.
    Next,
    /// Download the video after next.
    SecondNext,
    /// Start a new episode.
    Reset,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Pause,
        Action::Current,
        Action::Next,
        Action::SecondNext,
        Action::Reset,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Action> {
        Self::ALL.get(ordinal).copied()
    }

    /// The player numbers its actions starting at -1 (`Pause`).
    pub fn wire_value(self) -> i32 {
        self as i32 - 1
    }

    pub fn from_wire_value(value: i32) -> Option<Action> {
        usize::try_from(value + 1).ok().and_then(Self::from_ordinal)
    }

    /// Whether an agent may pass this action to `step`.
    pub fn is_legal(self) -> bool {
        self.ordinal() < NUM_LEGAL_ACTIONS
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::Pause => write!(f, "PAUSE"),
            Action::Current => write!(f, "CURRENT"),
            Action::Next => write!(f, "NEXT"),
            Action::SecondNext => write!(f, "SECOND_NEXT"),
            Action::Reset => write!(f, "RESET"),
        }
    }
}
