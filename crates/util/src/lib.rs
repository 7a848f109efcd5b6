pub mod config;

use std::env;

pub use config::{ConfigError, Environment, InitConfig, MongoTarget, SeedMode};

pub const DEFAULT_RETRY_SECONDS: u64 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe inside containers
/// where dotenv files are not deployed.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the delay between connection attempts, in seconds.
///
/// The value is resolved from `RETRY_CONNECTION_SECONDS` and falls back to
/// [`DEFAULT_RETRY_SECONDS`] when the variable is missing or unusable.
pub fn retry_connection_seconds() -> u64 {
    parse_retry_seconds(env::var("RETRY_CONNECTION_SECONDS").ok().as_deref())
}

/// Parses a retry delay the way operators tend to write it.
///
/// Leading whitespace is skipped and only the leading run of digits is
/// considered, so `"10s"` and `"3.5"` yield `10` and `3`. Anything that does
/// not start with a digit, or parses to zero, yields the default.
pub fn parse_retry_seconds(value: Option<&str>) -> u64 {
    value
        .and_then(leading_integer)
        .filter(|seconds| *seconds > 0)
        .unwrap_or(DEFAULT_RETRY_SECONDS)
}

/// Parses an optional positive count, treating `0` and garbage as absent.
pub fn parse_positive_count(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|count| *count > 0)
}

/// Interprets common truthy spellings used in deployment manifests.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::LazyLock<std::sync::Mutex<()>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(()));

fn leading_integer(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_end == 0 {
        return None;
    }
    unsigned[..digits_end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn retry_seconds_default_when_env_missing() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("RETRY_CONNECTION_SECONDS");
        assert_eq!(retry_connection_seconds(), DEFAULT_RETRY_SECONDS);
    }

    #[test]
    fn retry_seconds_read_from_env() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::set_var("RETRY_CONNECTION_SECONDS", "12");
        assert_eq!(retry_connection_seconds(), 12);
        env::remove_var("RETRY_CONNECTION_SECONDS");
    }

    #[test]
    fn retry_seconds_fall_back_on_unusable_values() {
        for raw in ["", "   ", "0", "-3", "abc", "s10", "99999999999999999999999"] {
            assert_eq!(
                parse_retry_seconds(Some(raw)),
                DEFAULT_RETRY_SECONDS,
                "value {raw:?} should fall back"
            );
        }
        assert_eq!(parse_retry_seconds(None), DEFAULT_RETRY_SECONDS);
    }

    #[test]
    fn retry_seconds_use_leading_digits() {
        assert_eq!(parse_retry_seconds(Some("10s")), 10);
        assert_eq!(parse_retry_seconds(Some("3.7")), 3);
        assert_eq!(parse_retry_seconds(Some(" +8")), 8);
    }

    #[test]
    fn positive_count_ignores_zero_and_garbage() {
        assert_eq!(parse_positive_count(Some("4")), Some(4));
        assert_eq!(parse_positive_count(Some("0")), None);
        assert_eq!(parse_positive_count(Some("many")), None);
        assert_eq!(parse_positive_count(None), None);
    }

    #[test]
    fn flag_accepts_truthy_spellings() {
        for raw in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(Some(raw)), "{raw:?} should be truthy");
        }
        for raw in ["0", "false", "no", ""] {
            assert!(!parse_flag(Some(raw)), "{raw:?} should be falsy");
        }
        assert!(!parse_flag(None));
    }
}
