use std::env;
use std::path::PathBuf;

use crate::parse_flag;

/// HTTP server settings.
///
/// # Environment Variables
///
/// - `SERVER_ADDR`: listen address (default: `0.0.0.0:3000`)
/// - `LOG_DIR`: directory of the daily JSON log files (default: `storage/logs`)
/// - `OBSERVABILITY_ENABLED`: expose Prometheus metrics on `/metrics`
///   (default: `true`)
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub log_dir: PathBuf,
    pub observability_enabled: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            addr: lookup("SERVER_ADDR").unwrap_or(defaults.addr),
            log_dir: lookup("LOG_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            observability_enabled: lookup("OBSERVABILITY_ENABLED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.observability_enabled),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".into(),
            log_dir: PathBuf::from("storage/logs"),
            observability_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            "LOG_DIR" => Some("/var/log/registrar".into()),
            "OBSERVABILITY_ENABLED" => Some("off".into()),
            _ => None,
        });

        assert_eq!(config.addr, "0.0.0.0:3000");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/registrar"));
        assert!(!config.observability_enabled);
    }

    #[test]
    fn test_unparseable_flag_keeps_metrics_on() {
        let config = ServerConfig::from_lookup(|key| {
            (key == "OBSERVABILITY_ENABLED").then(|| "maybe".to_string())
        });
        assert!(config.observability_enabled);
    }
}
