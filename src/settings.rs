use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use log::{info, warn};

use crate::error::AppError;

/// Accepted values for `RECIPES_SESSION_TTL_DAYS`.
pub const SESSION_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=36500;

#[derive(Clone, Debug)]
pub struct TemplateSettings {
    pub dir: String,
    pub debug: bool,
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl_days: i64,
    pub secure: bool,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub max_body_bytes: usize,
    /// Use minimal argon2 parameters. Only meant for development and tests.
    pub fast_password_hashing: bool,
    pub template: TemplateSettings,
    pub session: SessionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://recipes.db".to_string(),
            db_max_connections: 5,
            max_body_bytes: 64 * 1024,
            fast_password_hashing: false,
            template: TemplateSettings {
                dir: "templates".to_string(),
                debug: false,
            },
            session: SessionSettings {
                cookie_name: "sessionid".to_string(),
                ttl_days: 14,
                secure: false,
            },
        }
    }
}

impl Settings {
    /// Build settings from `RECIPES_*` environment variables, falling back to
    /// [`Settings::default`] for anything unset.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Settings::default();
        Ok(Settings {
            debug: try_load("RECIPES_DEBUG", defaults.debug)?,
            host: try_load("RECIPES_HOST", defaults.host)?,
            port: try_load("RECIPES_PORT", defaults.port)?,
            database_url: try_load("RECIPES_DATABASE_URL", defaults.database_url)?,
            db_max_connections: try_load(
                "RECIPES_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            max_body_bytes: try_load("RECIPES_MAX_BODY_BYTES", defaults.max_body_bytes)?,
            fast_password_hashing: try_load(
                "RECIPES_FAST_PASSWORD_HASHING",
                defaults.fast_password_hashing,
            )?,
            template: TemplateSettings {
                dir: try_load("RECIPES_TEMPLATE_DIR", defaults.template.dir)?,
                debug: try_load("RECIPES_TEMPLATE_DEBUG", defaults.template.debug)?,
            },
            session: SessionSettings {
                cookie_name: try_load("RECIPES_SESSION_COOKIE", defaults.session.cookie_name)?,
                ttl_days: check_range(
                    "RECIPES_SESSION_TTL_DAYS",
                    try_load("RECIPES_SESSION_TTL_DAYS", defaults.session.ttl_days)?,
                    SESSION_TTL_DAYS_RANGE,
                )?,
                secure: try_load("RECIPES_SESSION_SECURE", defaults.session.secure)?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_or_default(key, env::var(key).ok(), default)
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}");
            AppError::Config(format!("{key}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn check_range<T>(key: &str, value: T, range: RangeInclusive<T>) -> Result<T, AppError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        warn!("{key} value {value} is out of range");
        Err(AppError::Config(format!(
            "{key}: {value} is not between {} and {}",
            range.start(),
            range.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_value_uses_default() {
        let port: u16 = parse_or_default("RECIPES_PORT", None, 8000).unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn value_is_trimmed_and_parsed() {
        let port: u16 = parse_or_default("RECIPES_PORT", Some(" 9000 ".into()), 8000).unwrap();
        assert_eq!(port, 9000);
        let secure: bool =
            parse_or_default("RECIPES_SESSION_SECURE", Some("true".into()), false).unwrap();
        assert!(secure);
    }

    #[test]
    fn unparsable_value_is_config_error() {
        let err = parse_or_default::<u16>("RECIPES_PORT", Some("abc".into()), 8000).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("RECIPES_PORT")));

        let err = parse_or_default::<u16>("RECIPES_PORT", Some("70000".into()), 8000).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn session_ttl_outside_range_is_rejected() {
        for days in [-5, 0, 36501, 100_000_000] {
            let err = check_range("RECIPES_SESSION_TTL_DAYS", days, SESSION_TTL_DAYS_RANGE)
                .unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{days}");
        }
        for days in [1, 14, 36500] {
            assert_eq!(
                check_range("RECIPES_SESSION_TTL_DAYS", days, SESSION_TTL_DAYS_RANGE).unwrap(),
                days
            );
        }
    }
}
