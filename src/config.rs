use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::intake::IntakeSettings;

const MAX_EXTENDED_RETURN_DAYS: i64 = 365;
const MAX_STANDARD_RETURN_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub http_timeout_secs: u64,
    pub scan_min_length: usize,
    pub scan_debounce_ms: u64,
    pub national_id_length: usize,
    pub observations_max_len: usize,
    pub extended_return_days: i64,
    pub standard_return_hours: i64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .map_err(|_| AppError::Config("API_BASE_URL is not set".to_string()))?;
        if api_base_url.trim().is_empty() {
            return Err(AppError::Config("API_BASE_URL is empty".to_string()));
        }

        let config = Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
            http_timeout_secs: var_or("HTTP_TIMEOUT_SECS", 30),
            scan_min_length: var_or("SCAN_MIN_LENGTH", 3),
            scan_debounce_ms: var_or("SCAN_DEBOUNCE_MS", 800),
            national_id_length: var_or("NATIONAL_ID_LENGTH", 10),
            observations_max_len: var_or("OBSERVATIONS_MAX_LEN", 250),
            extended_return_days: var_or("EXTENDED_RETURN_DAYS", 10),
            standard_return_hours: var_or("STANDARD_RETURN_HOURS", 24),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject return windows that are not positive or are unreasonably long
    pub fn validate(&self) -> AppResult<()> {
        check_range(
            "EXTENDED_RETURN_DAYS",
            self.extended_return_days,
            MAX_EXTENDED_RETURN_DAYS,
        )?;
        check_range(
            "STANDARD_RETURN_HOURS",
            self.standard_return_hours,
            MAX_STANDARD_RETURN_HOURS,
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn intake_settings(&self) -> IntakeSettings {
        IntakeSettings {
            scan_min_length: self.scan_min_length.max(1),
            scan_debounce: Duration::from_millis(self.scan_debounce_ms),
            national_id_length: self.national_id_length.max(1),
            observations_max_len: self.observations_max_len,
            extended_return_days: self.extended_return_days,
            standard_return_hours: self.standard_return_hours,
        }
    }
}

fn check_range(key: &str, value: i64, max: i64) -> AppResult<()> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be between 1 and {}, got {}",
            key, max, value
        )))
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_falls_back_on_garbage() {
        env::set_var("EQUIPMENT_LOANS_TEST_NUMBER", "not-a-number");
        assert_eq!(var_or("EQUIPMENT_LOANS_TEST_NUMBER", 42u64), 42);
        env::set_var("EQUIPMENT_LOANS_TEST_NUMBER", " 7 ");
        assert_eq!(var_or("EQUIPMENT_LOANS_TEST_NUMBER", 42u64), 7);
        env::remove_var("EQUIPMENT_LOANS_TEST_NUMBER");
    }

    fn config() -> Config {
        Config {
            api_base_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            http_timeout_secs: 30,
            scan_min_length: 0,
            scan_debounce_ms: 1500,
            national_id_length: 10,
            observations_max_len: 250,
            extended_return_days: 10,
            standard_return_hours: 24,
        }
    }

    #[test]
    fn test_intake_settings() {
        let settings = config().intake_settings();
        assert_eq!(settings.scan_min_length, 1);
        assert_eq!(settings.scan_debounce, Duration::from_millis(1500));
        assert_eq!(settings.national_id_length, 10);
    }

    #[test]
    fn test_return_windows_must_be_in_range() {
        assert!(config().validate().is_ok());

        for hours in [0, -48, MAX_STANDARD_RETURN_HOURS + 1, i64::MAX] {
            let broken = Config {
                standard_return_hours: hours,
                ..config()
            };
            assert!(matches!(
                broken.validate(),
                Err(AppError::Config(ref m)) if m.contains("STANDARD_RETURN_HOURS")
            ));
        }
        for days in [0, -1, MAX_EXTENDED_RETURN_DAYS + 1, 100_000_000] {
            let broken = Config {
                extended_return_days: days,
                ..config()
            };
            assert!(matches!(
                broken.validate(),
                Err(AppError::Config(ref m)) if m.contains("EXTENDED_RETURN_DAYS")
            ));
        }
    }
}
