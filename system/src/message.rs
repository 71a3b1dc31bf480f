use serde::{Deserialize, Serialize};

use crate::{ActiveTimerView, Timer};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimers {
    pub active_timers: Vec<Timer>,
    pub completed_timers: Vec<Timer>,
}

/// Frames pushed to an authenticated channel. A full snapshot (`AllTimers`)
/// supersedes everything the client holds; `ActiveTimers` only replaces the
/// active view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    AllTimers(AllTimers),
    ActiveTimers(Vec<ActiveTimerView>),
}

/// Sent once on a failed handshake, right before the channel is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
}

impl ErrorFrame {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
