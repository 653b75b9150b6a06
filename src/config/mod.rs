use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate;

/// Upper bound for the no-show grace period: one day.
pub const MAX_GRACE_MINUTES: i64 = 1440;

/// What the availability view reports when the store cannot be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Every station is shown as unavailable, with a retry hint.
    #[default]
    Closed,
    /// Every station is shown as available, with a warning.
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_cache_ttl")]
    pub availability_cache_ttl_secs: u64,
    #[serde(default)]
    pub availability_on_error: FailurePolicy,
    #[serde(default = "default_grace")]
    pub no_show_grace_minutes: i64,
    #[serde(default)]
    pub require_check_in: bool,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_cache_ttl() -> u64 {
    120
}
fn default_grace() -> i64 {
    30
}
fn default_sweep_interval() -> u64 {
    300
}
fn default_currency() -> String {
    "₹".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file().to_string_lossy().to_string())
    }
}

impl Config {
    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            availability_cache_ttl_secs: default_cache_ttl(),
            availability_on_error: FailurePolicy::default(),
            no_show_grace_minutes: default_grace(),
            require_check_in: false,
            sweep_interval_secs: default_sweep_interval(),
            currency: default_currency(),
        }
    }

    /// Return the standard configuration directory (`~/.rlounge`)
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rlounge")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rlounge.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rlounge.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let cfg: Config =
            serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database.trim().is_empty() {
            return Err(AppError::Config("'database' must not be empty".into()));
        }
        if !(0..=MAX_GRACE_MINUTES).contains(&self.no_show_grace_minutes) {
            return Err(AppError::Config(format!(
                "'no_show_grace_minutes' must be between 0 and {}",
                MAX_GRACE_MINUTES
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "'sweep_interval_secs' must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let yaml = self.to_yaml()?;
        let mut file = fs::File::create(path).map_err(|_| AppError::ConfigSave)?;
        file.write_all(yaml.as_bytes())
            .map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    /// Create config dir, config file and an empty database file.
    /// Returns the configuration that was written (or would have been, in test mode).
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() || is_test {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Self::with_database(db_path.to_string_lossy().to_string());

        if !is_test {
            fs::create_dir_all(&dir)?;
            config.save(&Self::config_file())?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = Config::from_yaml("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.availability_cache_ttl_secs, 120);
        assert_eq!(cfg.availability_on_error, FailurePolicy::Closed);
        assert_eq!(cfg.no_show_grace_minutes, 30);
        assert!(!cfg.require_check_in);
    }

    #[test]
    fn failure_policy_parses_lowercase() {
        let cfg =
            Config::from_yaml("database: x.sqlite\navailability_on_error: open\n").unwrap();
        assert_eq!(cfg.availability_on_error, FailurePolicy::Open);
    }

    #[test]
    fn negative_grace_is_rejected() {
        let err = Config::from_yaml("database: x.sqlite\nno_show_grace_minutes: -5\n");
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn grace_is_capped_at_one_day() {
        assert!(Config::from_yaml("database: x.sqlite\nno_show_grace_minutes: 1440\n").is_ok());
        let err = Config::from_yaml("database: x.sqlite\nno_show_grace_minutes: 9223372036854775807\n");
        assert!(matches!(err, Err(AppError::Config(_))));
    }
}
