use std::str::FromStr;
use std::time::Duration;

use vigil_core::scoring::MAX_SCORE;
use vigil_core::Score;

/// Errors raised while loading or validating [`MonitorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid monitor configuration: {0}")]
    Validation(String),
}

/// Health engine configuration.
///
/// All fields have defaults suitable for a single home hub. Override via
/// environment variables with [`MonitorConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between full polls (default: 30s).
    pub poll_interval: Duration,
    /// Per-probe timeout (default: 5s).
    pub check_timeout: Duration,
    /// Platform score below which alerts fire (default: 70).
    pub alert_threshold: Score,
    /// How long the score must stay below threshold before the sustained
    /// degradation alert fires (default: 10 minutes).
    pub sustained_degradation: Duration,
    /// Window in which identical unresolved alerts are suppressed
    /// (default: 5 minutes).
    pub alert_dedup_window: Duration,
    /// Alert log capacity (default: 100).
    pub max_alerts: usize,
    /// Time between history snapshots (default: 5 minutes).
    pub snapshot_interval: Duration,
    /// Rolling history length (default: 288, 24h at 5-minute resolution).
    pub max_snapshots: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            check_timeout: Duration::from_millis(5000),
            alert_threshold: 70,
            sustained_degradation: Duration::from_secs(600),
            alert_dedup_window: Duration::from_secs(300),
            max_alerts: 100,
            snapshot_interval: Duration::from_secs(300),
            max_snapshots: 288,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default |
    /// |------------------------------------|---------|
    /// | `VIGIL_POLL_INTERVAL_SECS`         | `30`    |
    /// | `VIGIL_CHECK_TIMEOUT_MS`           | `5000`  |
    /// | `VIGIL_ALERT_THRESHOLD`            | `70`    |
    /// | `VIGIL_SUSTAINED_DEGRADATION_SECS` | `600`   |
    /// | `VIGIL_ALERT_DEDUP_WINDOW_SECS`    | `300`   |
    /// | `VIGIL_MAX_ALERTS`                 | `100`   |
    /// | `VIGIL_SNAPSHOT_INTERVAL_SECS`     | `300`   |
    /// | `VIGIL_MAX_SNAPSHOTS`              | `288`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            poll_interval: Duration::from_secs(env_or(
                "VIGIL_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )?),
            check_timeout: Duration::from_millis(env_or(
                "VIGIL_CHECK_TIMEOUT_MS",
                defaults.check_timeout.as_millis() as u64,
            )?),
            alert_threshold: env_or("VIGIL_ALERT_THRESHOLD", defaults.alert_threshold)?,
            sustained_degradation: Duration::from_secs(env_or(
                "VIGIL_SUSTAINED_DEGRADATION_SECS",
                defaults.sustained_degradation.as_secs(),
            )?),
            alert_dedup_window: Duration::from_secs(env_or(
                "VIGIL_ALERT_DEDUP_WINDOW_SECS",
                defaults.alert_dedup_window.as_secs(),
            )?),
            max_alerts: env_or("VIGIL_MAX_ALERTS", defaults.max_alerts)?,
            snapshot_interval: Duration::from_secs(env_or(
                "VIGIL_SNAPSHOT_INTERVAL_SECS",
                defaults.snapshot_interval.as_secs(),
            )?),
            max_snapshots: env_or("VIGIL_MAX_SNAPSHOTS", defaults.max_snapshots)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alert_threshold > MAX_SCORE {
            return Err(ConfigError::Validation(format!(
                "alert threshold must not exceed {MAX_SCORE}"
            )));
        }
        for (name, value) in [
            ("poll interval", self.poll_interval),
            ("check timeout", self.check_timeout),
            ("snapshot interval", self.snapshot_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Validation(format!("{name} must be non-zero")));
            }
        }
        if self.max_alerts == 0 || self.max_snapshots == 0 {
            return Err(ConfigError::Validation(
                "alert and snapshot capacities must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse `var` if set, otherwise return `default`.
fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}
