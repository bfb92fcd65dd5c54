//! Runtime configuration: per-environment defaults, TOML file overrides,
//! and `MOBIUS_ASSIGN_*` environment variable overrides, mirroring the
//! `dev`/`test`/`stage`/`prod` tiering of the original Staffjoy worker.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {value}")]
    InvalidEnvOverride { var: String, value: String },
}

/// Deployment tier, selected by `MOBIUS_ASSIGN_ENV` (default `prod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Dev,
    Test,
    Stage,
    Prod,
}

impl Env {
    fn from_env_var() -> Env {
        match std::env::var("MOBIUS_ASSIGN_ENV").as_deref() {
            Ok("dev") => Env::Dev,
            Ok("test") => Env::Test,
            Ok("stage") => Env::Stage,
            _ => Env::Prod,
        }
    }
}

/// Tuning knobs for a calculation run. Everything here has a tier default;
/// a TOML file and then environment variables may override individual
/// fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub env: EnvMarker,
    pub tasking_fetch_interval_seconds: u64,
    pub max_hours_per_shift: u32,
    pub unassigned_penalty: f64,
    pub min_hours_violation_penalty: f64,
    pub threads: u32,
    pub max_tuning_time_seconds: u64,
    pub tune_file: String,
    pub happy_calculation_timeout_seconds: u64,
    pub kill_on_error: bool,
    pub kill_delay_seconds: u64,
    /// Reproduces a decrement-twice quirk in the reference worker's
    /// `max_hours_per_workweek` bookkeeping for shifts already on the
    /// schedule (see DESIGN.md). Left on by default for parity with the
    /// corpus this engine was validated against.
    pub double_decrement_existing_shift_hours: bool,
}

/// Newtype so `Env` can round-trip through `#[serde(default)]` without
/// requiring every tier variant to implement `Default` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EnvMarker(pub Env);

impl Default for EnvMarker {
    fn default() -> Self {
        EnvMarker(Env::Prod)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_tier(Env::Prod)
    }
}

impl Config {
    /// The tier-specific defaults, matching `mobius.config`.
    pub fn for_tier(env: Env) -> Config {
        let mut cfg = Config {
            env: EnvMarker(env),
            tasking_fetch_interval_seconds: 20,
            max_hours_per_shift: 23,
            unassigned_penalty: -1000.0,
            min_hours_violation_penalty: -1000.0,
            threads: 16,
            max_tuning_time_seconds: 60 * 60,
            tune_file: "tuning.prm".to_string(),
            happy_calculation_timeout_seconds: 20 * 60,
            kill_on_error: true,
            kill_delay_seconds: 60,
            double_decrement_existing_shift_hours: true,
        };
        match env {
            Env::Dev => {
                cfg.tasking_fetch_interval_seconds = 5;
                cfg.max_tuning_time_seconds = 5 * 60;
                cfg.kill_on_error = false;
            }
            Env::Test => {
                cfg.threads = 6;
                cfg.kill_on_error = false;
            }
            Env::Stage | Env::Prod => {}
        }
        cfg
    }

    /// Loads configuration: tier defaults from `MOBIUS_ASSIGN_ENV`, then a
    /// TOML file at `path` if it exists, then `MOBIUS_ASSIGN_*` environment
    /// variable overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let env = Env::from_env_var();
        let mut cfg = Config::for_tier(env);

        let path = path.as_ref();
        if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let file_cfg: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            cfg = file_cfg;
        }

        apply_env_overrides(&mut cfg)?;
        Ok(cfg)
    }
}

fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    macro_rules! override_parsed {
        ($var:literal, $field:expr) => {
            if let Ok(value) = std::env::var($var) {
                $field = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnvOverride {
                        var: $var.to_string(),
                        value: value.clone(),
                    })?;
            }
        };
    }

    override_parsed!(
        "MOBIUS_ASSIGN_TASKING_FETCH_INTERVAL_SECONDS",
        cfg.tasking_fetch_interval_seconds
    );
    override_parsed!("MOBIUS_ASSIGN_MAX_HOURS_PER_SHIFT", cfg.max_hours_per_shift);
    override_parsed!("MOBIUS_ASSIGN_THREADS", cfg.threads);
    override_parsed!(
        "MOBIUS_ASSIGN_HAPPY_CALCULATION_TIMEOUT_SECONDS",
        cfg.happy_calculation_timeout_seconds
    );
    override_parsed!("MOBIUS_ASSIGN_KILL_ON_ERROR", cfg.kill_on_error);
    override_parsed!("MOBIUS_ASSIGN_KILL_DELAY_SECONDS", cfg.kill_delay_seconds);
    override_parsed!(
        "MOBIUS_ASSIGN_DOUBLE_DECREMENT_EXISTING_SHIFT_HOURS",
        cfg.double_decrement_existing_shift_hours
    );

    if let Ok(tune_file) = std::env::var("MOBIUS_ASSIGN_TUNE_FILE") {
        cfg.tune_file = tune_file;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_tier_disables_kill_on_error() {
        let cfg = Config::for_tier(Env::Dev);
        assert!(!cfg.kill_on_error);
        assert_eq!(cfg.tasking_fetch_interval_seconds, 5);
    }

    #[test]
    fn test_tier_uses_fewer_threads() {
        let cfg = Config::for_tier(Env::Test);
        assert_eq!(cfg.threads, 6);
    }

    #[test]
    fn prod_default_keeps_legacy_double_decrement() {
        let cfg = Config::default();
        assert!(cfg.double_decrement_existing_shift_hours);
        assert_eq!(cfg.kill_delay_seconds, 60);
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_missing() {
        let cfg = Config::load("/nonexistent/path/mobius-assign.toml").unwrap();
        assert_eq!(cfg.max_hours_per_shift, 23);
    }
}
