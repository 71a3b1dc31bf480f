use std::env;
use std::str::FromStr;

use system::chrono::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_ttl_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_var("PORT", DEFAULT_PORT),
            session_ttl_days: parse_ttl_days("SESSION_TTL_DAYS"),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_ttl_days.clamp(1, MAX_SESSION_TTL_DAYS))
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("{} has invalid value {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Session lifetime in days, between one day and ten years.
fn parse_ttl_days(name: &str) -> i64 {
    let days = parse_var(name, DEFAULT_SESSION_TTL_DAYS);
    if (1..=MAX_SESSION_TTL_DAYS).contains(&days) {
        days
    } else {
        log::warn!(
            "{} must be within 1..={}, got {}, using {}",
            name,
            MAX_SESSION_TTL_DAYS,
            days,
            DEFAULT_SESSION_TTL_DAYS
        );
        DEFAULT_SESSION_TTL_DAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_a_week_of_session_lifetime() {
        let config = Config::default();
        assert_eq!(config.session_ttl(), Duration::days(7));
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 3000));
    }

    #[test]
    fn it_falls_back_on_unparsable_values() {
        env::set_var("TIMER_SYNC_TEST_PORT", "not-a-port");
        assert_eq!(parse_var("TIMER_SYNC_TEST_PORT", 3000u16), 3000);
        env::set_var("TIMER_SYNC_TEST_PORT", "8081");
        assert_eq!(parse_var("TIMER_SYNC_TEST_PORT", 3000u16), 8081);
    }

    #[test]
    fn it_rejects_session_lifetime_out_of_range() {
        for raw in &["-3", "0", "100000000", "9223372036854775807"] {
            env::set_var("TIMER_SYNC_TEST_TTL", raw);
            assert_eq!(parse_ttl_days("TIMER_SYNC_TEST_TTL"), 7, "{}", raw);
        }
        env::set_var("TIMER_SYNC_TEST_TTL", "30");
        assert_eq!(parse_ttl_days("TIMER_SYNC_TEST_TTL"), 30);
    }

    #[test]
    fn it_bounds_session_lifetime_set_directly() {
        let config = Config {
            session_ttl_days: i64::MAX,
            ..Config::default()
        };
        assert_eq!(config.session_ttl(), Duration::days(3650));

        let config = Config {
            session_ttl_days: -1,
            ..Config::default()
        };
        assert_eq!(config.session_ttl(), Duration::days(1));
    }
}
