//! Environment variable parsing with warn-level logging for invalid values.

use std::time::Duration;

use crate::constants::{ENV_READY_ATTEMPTS, ENV_READY_INTERVAL_MS, READY_ATTEMPTS, READY_INTERVAL_MS};

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Bounded fixed-interval polling policy for the destination readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl ReadinessPolicy {
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Defaults, overridden by `AEDELORE_MIGRATE_READY_ATTEMPTS` and
    /// `AEDELORE_MIGRATE_READY_INTERVAL_MS` when they parse.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            attempts: env_parse_with_default(ENV_READY_ATTEMPTS, READY_ATTEMPTS),
            interval: Duration::from_millis(env_parse_with_default(
                ENV_READY_INTERVAL_MS,
                READY_INTERVAL_MS,
            )),
        }
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(READY_ATTEMPTS, Duration::from_millis(READY_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SAFETY (all tests below): each test owns a unique variable name, so no
    // other thread reads or writes it concurrently.

    #[test]
    fn test_env_parse_valid_value() {
        let var_name = "TEST_ENV_PARSE_VALID_51802";
        unsafe { std::env::set_var(var_name, "42") };
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 42);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_invalid_value() {
        let var_name = "TEST_ENV_PARSE_INVALID_51803";
        unsafe { std::env::set_var(var_name, "thirty") };
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 10);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_missing_var() {
        let var_name = "TEST_ENV_PARSE_MISSING_51804";
        unsafe { std::env::remove_var(var_name) };
        let result: u64 = env_parse_with_default(var_name, 1000);
        assert_eq!(result, 1000);
    }

    #[test]
    fn test_env_parse_empty_value() {
        let var_name = "TEST_ENV_PARSE_EMPTY_51805";
        unsafe { std::env::set_var(var_name, "") };
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 10);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn default_policy_is_thirty_one_second_probes() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.attempts, 30);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }
}
