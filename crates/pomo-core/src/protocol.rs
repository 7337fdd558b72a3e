//! Request/response vocabulary between observers and the canonical clock.
//!
//! Every request is answered with the full [`ClockSnapshot`].

use serde::{Deserialize, Serialize};

use crate::error::PomoError;

/// A mutating command an observer may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Start,
    Pause,
    Reset,
}

impl std::str::FromStr for Action {
    type Err = PomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "start" => Ok(Action::Start),
            "p" | "pause" => Ok(Action::Pause),
            "r" | "reset" => Ok(Action::Reset),
            other => Err(PomoError::Config(format!("unknown action: {other}"))),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// The four message kinds of the observer protocol.
///
/// Serialised as `{"action": "getState"}`, `{"action": "start"}` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetState,
    Start,
    Pause,
    Reset,
}

impl Request {
    /// The command carried by this request, or `None` for a pure query.
    pub fn action(self) -> Option<Action> {
        match self {
            Request::GetState => None,
            Request::Start => Some(Action::Start),
            Request::Pause => Some(Action::Pause),
            Request::Reset => Some(Action::Reset),
        }
    }
}

impl From<Action> for Request {
    fn from(action: Action) -> Self {
        match action {
            Action::Start => Request::Start,
            Action::Pause => Request::Pause,
            Action::Reset => Request::Reset,
        }
    }
}
