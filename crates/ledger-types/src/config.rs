//! Runtime configuration: ledger capacity, summary windows, feed buffering.

use chrono::Duration;
use std::str::FromStr;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_FEED_BUFFER: usize = 1024;

/// Trailing windows counted by the summary query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindows {
    /// Reported as `eventsInLastHour`.
    pub short: Duration,
    /// Reported as `eventsInLast24Hours`.
    pub long: Duration,
}

impl Default for SummaryWindows {
    fn default() -> Self {
        Self {
            short: Duration::hours(1),
            long: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub capacity: usize,
    pub windows: SummaryWindows,
    /// Depth of the in-process feed channel.
    pub feed_buffer: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            windows: SummaryWindows::default(),
            feed_buffer: DEFAULT_FEED_BUFFER,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let capacity = parse_or(&lookup, "ANALYTICS_LEDGER_CAPACITY", defaults.capacity)?;
        let feed_buffer = parse_or(&lookup, "ANALYTICS_FEED_BUFFER", defaults.feed_buffer)?;
        let short = window_or(&lookup, "ANALYTICS_SHORT_WINDOW_SECS", defaults.windows.short)?;
        let long = window_or(&lookup, "ANALYTICS_LONG_WINDOW_SECS", defaults.windows.long)?;
        if capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "ANALYTICS_LEDGER_CAPACITY",
                value: "0".to_string(),
            });
        }
        if feed_buffer == 0 {
            return Err(ConfigError::Invalid {
                key: "ANALYTICS_FEED_BUFFER",
                value: "0".to_string(),
            });
        }
        Ok(Self {
            capacity,
            windows: SummaryWindows { short, long },
            feed_buffer,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn window_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => {
            let secs: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                value: raw.clone(),
            })?;
            if secs < 0 {
                return Err(ConfigError::Invalid { key, value: raw });
            }
            Duration::try_seconds(secs).ok_or(ConfigError::Invalid { key, value: raw })
        }
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
