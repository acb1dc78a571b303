//! Application-level configuration loading: play timers, grace period and leaderboard size.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BOT_BACK_CONFIG_PATH";

const DEFAULT_TIMER_CHOICES_SECS: [u64; 3] = [10, 15, 30];
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);
const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const DEFAULT_CHAT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Question windows a player may pick, in seconds, in display order.
    pub timer_choices_secs: Vec<u64>,
    /// Extra wait after the last question window so late answers still count.
    pub grace_period: Duration,
    /// Number of results shown on a quiz leaderboard.
    pub leaderboard_size: usize,
    /// Capacity of the broadcast channel feeding chat event streams.
    pub chat_event_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        timers = ?app_config.timer_choices_secs,
                        grace_period_secs = app_config.grace_period.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Whether `secs` is one of the offered question windows.
    pub fn allows_timer(&self, secs: u64) -> bool {
        self.timer_choices_secs.contains(&secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timer_choices_secs: DEFAULT_TIMER_CHOICES_SECS.to_vec(),
            grace_period: DEFAULT_GRACE_PERIOD,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            chat_event_capacity: DEFAULT_CHAT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Missing keys keep their default value.
struct RawConfig {
    timer_choices_secs: Option<Vec<u64>>,
    grace_period_secs: Option<u64>,
    leaderboard_size: Option<usize>,
    chat_event_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();

        let timer_choices_secs = value
            .timer_choices_secs
            .map(|mut timers| {
                timers.retain(|secs| *secs > 0);
                timers.dedup();
                timers
            })
            .filter(|timers| !timers.is_empty())
            .unwrap_or(defaults.timer_choices_secs);

        Self {
            timer_choices_secs,
            grace_period: value
                .grace_period_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.grace_period),
            leaderboard_size: value
                .leaderboard_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.leaderboard_size),
            chat_event_capacity: value
                .chat_event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.chat_event_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"grace_period_secs": 1}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.grace_period, Duration::from_secs(1));
        assert_eq!(config.timer_choices_secs, vec![10, 15, 30]);
        assert_eq!(config.leaderboard_size, 10);
    }

    #[test]
    fn zero_or_empty_values_are_replaced() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"timer_choices_secs": [0], "leaderboard_size": 0, "chat_event_capacity": 0}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn allowed_timers() {
        let config = AppConfig::default();
        assert!(config.allows_timer(15));
        assert!(!config.allows_timer(20));
    }
}
