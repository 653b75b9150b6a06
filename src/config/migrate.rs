//! Config file upgrades: detect keys added in newer versions and write them
//! back with their default values, never touching what the user already set.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn parse_mapping(content: &str) -> AppResult<Mapping> {
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config("config file is not a YAML mapping".into())),
    }
}

fn default_mapping() -> AppResult<Mapping> {
    let value =
        serde_yaml::to_value(Config::default()).map_err(|e| AppError::Config(e.to_string()))?;
    match value {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Other("default config is not a mapping".into())),
    }
}

/// Keys present in the current config schema but absent from `content`.
pub fn missing_fields(content: &str) -> AppResult<Vec<String>> {
    let current = parse_mapping(content)?;
    let defaults = default_mapping()?;

    Ok(defaults
        .keys()
        .filter(|k| !current.contains_key(*k))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect())
}

/// Merge defaults for every missing key into `content`.
pub fn merge_defaults(content: &str) -> AppResult<(String, Vec<String>)> {
    let mut current = parse_mapping(content)?;
    let defaults = default_mapping()?;
    let mut added = Vec::new();

    for (k, v) in defaults {
        if !current.contains_key(&k) {
            if let Some(name) = k.as_str() {
                added.push(name.to_string());
            }
            current.insert(k, v);
        }
    }

    let yaml = serde_yaml::to_string(&Value::Mapping(current))
        .map_err(|e| AppError::Config(e.to_string()))?;
    Ok((yaml, added))
}

/// Rewrite the config file at `path` with missing keys filled in.
pub fn run_config_migration(path: &Path) -> AppResult<Vec<String>> {
    if !path.exists() {
        info(format!("No config file at {}: nothing to migrate.", path.display()));
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let (yaml, added) = merge_defaults(&content)?;

    if added.is_empty() {
        info("Configuration is up to date.");
        return Ok(added);
    }

    // validate before overwriting
    Config::from_yaml(&yaml)?;
    fs::write(path, yaml).map_err(|_| AppError::ConfigSave)?;
    success(format!("Added missing config keys: {}", added.join(", ")));
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_keys_added_after_first_release() {
        let missing = missing_fields("database: /tmp/a.sqlite\ncurrency: $\n").unwrap();
        assert!(missing.contains(&"require_check_in".to_string()));
        assert!(missing.contains(&"sweep_interval_secs".to_string()));
        assert!(!missing.contains(&"database".to_string()));
        assert!(!missing.contains(&"currency".to_string()));
    }

    #[test]
    fn merge_keeps_user_values() {
        let (yaml, added) = merge_defaults("database: /tmp/a.sqlite\ncurrency: $\n").unwrap();
        assert!(!added.is_empty());
        let cfg = Config::from_yaml(&yaml).unwrap();
        assert_eq!(cfg.database, "/tmp/a.sqlite");
        assert_eq!(cfg.currency, "$");
        assert_eq!(cfg.no_show_grace_minutes, 30);
    }
}
