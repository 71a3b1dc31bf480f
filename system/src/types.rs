use chrono::{DateTime, SubsecRound, Utc};

pub type UserId = uuid::Uuid;
pub type TimerId = uuid::Uuid;
pub type ConnectionId = u64;

/// Wall-clock time truncated to whole milliseconds, the precision every
/// stored timestamp is kept at.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
