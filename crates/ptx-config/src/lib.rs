//! Runtime settings resolution.
//!
//! This module is the **single source of truth** for process configuration.
//!
//! # Contract
//! - At startup, callers invoke [`Settings::from_env`] once.
//! - The returned [`Settings`] is passed into constructors; never scatter
//!   `std::env::var` calls across the codebase.
//! - `Debug` impls on all secret-containing structs **redact** values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Required vs optional
//! - `PRETALX_URL`, `PRETALX_AUTH`, `PUSHOVER_API_TOKEN`, `PUSHOVER_USER_TOKEN`
//!   are **required**; a missing one is a [`ConfigError`].
//! - Everything else falls back to a default. An unparsable optional value
//!   falls back too, with a warning.

use std::fmt;
use std::time::Duration;

use tracing::warn;

pub const ENV_PRETALX_URL: &str = "PRETALX_URL";
pub const ENV_PRETALX_AUTH: &str = "PRETALX_AUTH";
pub const ENV_PUSHOVER_API_TOKEN: &str = "PUSHOVER_API_TOKEN";
pub const ENV_PUSHOVER_USER_TOKEN: &str = "PUSHOVER_USER_TOKEN";
pub const ENV_MINUTES: &str = "MINUTES";
pub const ENV_ONLY_NEW: &str = "ONLY_NEW";
pub const ENV_MESSAGE_MAX_CHARS: &str = "MESSAGE_MAX_CHARS";
pub const ENV_PUSHOVER_DEVICE: &str = "PUSHOVER_DEVICE";
pub const ENV_PUSHOVER_SOUND: &str = "PUSHOVER_SOUND";

pub const DEFAULT_MINUTES: u64 = 15;
/// One week. Larger `MINUTES` values are rejected.
pub const MAX_MINUTES: u64 = 7 * 24 * 60;
pub const DEFAULT_MESSAGE_MAX_CHARS: usize = 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    Missing { var: &'static str },
    /// A required variable is set but unusable.
    Invalid { var: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { var } => write!(
                f,
                "CONFIG_MISSING: required env var '{var}' is not set or empty"
            ),
            ConfigError::Invalid { var, reason } => {
                write!(f, "CONFIG_INVALID: env var '{var}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Credentials for the source and the sink.
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct Credentials {
    pub pretalx_token: String,
    pub pushover_app_token: String,
    pub pushover_user_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("pretalx_token", &"<REDACTED>")
            .field("pushover_app_token", &"<REDACTED>")
            .field("pushover_user_key", &"<REDACTED>")
            .finish()
    }
}

/// Everything the daemon needs, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Event API root, trailing `/` trimmed.
    pub pretalx_url: String,
    pub credentials: Credentials,
    pub interval: Duration,
    /// `true`: report new submissions only. `false`: new and changed.
    pub only_new: bool,
    pub message_max_chars: usize,
    pub pushover_device: Option<String>,
    /// `None`: keep the sink's default sound.
    pub pushover_sound: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Resolve a named environment variable.
/// Returns `None` if the variable is unset or its value is blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Boolean syntax: `1 t T TRUE true True` / `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Strictly positive integer.
pub fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

/// Poll interval in minutes: `1..=MAX_MINUTES`.
pub fn parse_minutes(raw: &str) -> Option<u64> {
    parse_positive(raw).filter(|v| *v <= MAX_MINUTES)
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { var })
}

fn optional<F>(lookup: &F, var: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_parsed<F, T, P>(lookup: &F, var: &'static str, default: T, parse: P) -> T
where
    F: Fn(&str) -> Option<String>,
    T: fmt::Display + Copy,
    P: Fn(&str) -> Option<T>,
{
    match optional(lookup, var) {
        None => default,
        Some(raw) => parse(&raw).unwrap_or_else(|| {
            warn!(var, %default, "env var has an invalid value, using default");
            default
        }),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(resolve_env)
    }

    /// Resolve settings through `lookup` (tests inject a map instead of the environment).
    ///
    /// # Errors
    /// Returns the first missing or invalid **required** variable, by name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pretalx_url = required(&lookup, ENV_PRETALX_URL)?;
        if !(pretalx_url.starts_with("http://") || pretalx_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: ENV_PRETALX_URL,
                reason: "expected an http(s) URL".to_string(),
            });
        }
        let pretalx_url = pretalx_url.trim_end_matches('/').to_string();

        let credentials = Credentials {
            pretalx_token: required(&lookup, ENV_PRETALX_AUTH)?,
            pushover_app_token: required(&lookup, ENV_PUSHOVER_API_TOKEN)?,
            pushover_user_key: required(&lookup, ENV_PUSHOVER_USER_TOKEN)?,
        };

        let minutes = optional_parsed(&lookup, ENV_MINUTES, DEFAULT_MINUTES, parse_minutes);
        let interval = match minutes.checked_mul(60) {
            Some(secs) => Duration::from_secs(secs),
            None => {
                warn!(
                    var = ENV_MINUTES,
                    default = DEFAULT_MINUTES,
                    "interval overflows, using default"
                );
                Duration::from_secs(DEFAULT_MINUTES * 60)
            }
        };
        let only_new = optional_parsed(&lookup, ENV_ONLY_NEW, false, parse_bool);
        let message_max_chars = optional_parsed(
            &lookup,
            ENV_MESSAGE_MAX_CHARS,
            DEFAULT_MESSAGE_MAX_CHARS as u64,
            parse_positive,
        ) as usize;

        Ok(Settings {
            pretalx_url,
            credentials,
            interval,
            only_new,
            message_max_chars,
            pushover_device: optional(&lookup, ENV_PUSHOVER_DEVICE),
            pushover_sound: optional(&lookup, ENV_PUSHOVER_SOUND),
        })
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }
}
