//! Configuration module for billing-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

use crate::services::production::DEFAULT_WINDOW_MONTHS;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub production_window_months: u32,
    pub task_cache_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::with_common(common)
    }

    /// Build from an already loaded base config, reading the rest from the environment.
    pub fn with_common(common: core_config::Config) -> Result<Self, AppError> {
        let production_window_months = match env::var("PRODUCTION_WINDOW_MONTHS") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|months| *months > 0)
                .ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "PRODUCTION_WINDOW_MONTHS must be a positive integer, got '{}'",
                        raw
                    ))
                })?,
            Err(_) => DEFAULT_WINDOW_MONTHS,
        };

        let task_cache_path = common.data_path(
            &env::var("TASK_CACHE_FILE").unwrap_or_else(|_| "completed_tasks.json".to_string()),
        );
        let snapshot_path = common.data_path(
            &env::var("SNAPSHOT_FILE").unwrap_or_else(|_| "snapshot.json".to_string()),
        );

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "billing-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            production_window_months,
            task_cache_path,
            snapshot_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_resolve_under_data_dir() {
        env::remove_var("PRODUCTION_WINDOW_MONTHS");
        env::remove_var("TASK_CACHE_FILE");
        env::remove_var("SNAPSHOT_FILE");

        let common = core_config::Config {
            data_dir: PathBuf::from("/srv/fieldops"),
            log_json: false,
        };
        let config = BillingConfig::with_common(common).unwrap();
        assert_eq!(config.production_window_months, 12);
        assert_eq!(
            config.task_cache_path,
            PathBuf::from("/srv/fieldops/completed_tasks.json")
        );
        assert_eq!(config.snapshot_path, PathBuf::from("/srv/fieldops/snapshot.json"));
    }

    #[test]
    #[serial]
    fn rejects_invalid_window() {
        env::set_var("PRODUCTION_WINDOW_MONTHS", "twelve");
        let err = BillingConfig::with_common(core_config::Config::default()).unwrap_err();
        env::remove_var("PRODUCTION_WINDOW_MONTHS");
        assert_eq!(err.kind(), "config");
    }
}
