use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TimerId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub user_id: UserId,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Milliseconds between `start` and `end`, set together with `end`.
    pub duration: Option<i64>,
    pub is_active: bool,
}

impl Timer {
    pub fn start(user_id: UserId, description: String, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            description,
            start: at,
            end: None,
            duration: None,
            is_active: true,
        }
    }

    /// Returns `false` without touching the record if it was already stopped.
    pub fn stop(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.end = Some(at);
        self.duration = Some((at - self.start).num_milliseconds());
        self.is_active = false;
        true
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start).num_milliseconds()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimerView {
    #[serde(flatten)]
    pub timer: Timer,
    pub current_duration: i64,
}

impl ActiveTimerView {
    pub fn at(timer: Timer, now: DateTime<Utc>) -> Self {
        let current_duration = timer.elapsed_ms(now);
        Self {
            timer,
            current_duration,
        }
    }
}
