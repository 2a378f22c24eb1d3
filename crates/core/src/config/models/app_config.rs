use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    database::DatabaseConfig,
    notifier::NotifierConfig,
    rotation::RotationConfig,
};

/// 未指定配置文件时依次尝试的路径
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/lead-rotation.toml",
    "lead-rotation.toml",
    "/etc/lead-rotation/config.toml",
];

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub rotation: RotationConfig,
    pub notifier: NotifierConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: ROTATION_, nesting: __)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Self::with_defaults(ConfigBuilder::builder())?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("ROTATION")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("api.cors_origins")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    fn with_defaults(
        builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = AppConfig::default();

        Ok(builder
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default(
                "database.idle_timeout_seconds",
                defaults.database.idle_timeout_seconds,
            )?
            .set_default("database.run_migrations", defaults.database.run_migrations)?
            .set_default(
                "rotation.claim_max_attempts",
                defaults.rotation.claim_max_attempts,
            )?
            .set_default("rotation.backoff_base_ms", defaults.rotation.backoff_base_ms)?
            .set_default("rotation.backoff_max_ms", defaults.rotation.backoff_max_ms)?
            .set_default(
                "rotation.backoff_jitter_factor",
                defaults.rotation.backoff_jitter_factor,
            )?
            .set_default(
                "rotation.reset_max_attempts",
                defaults.rotation.reset_max_attempts,
            )?
            .set_default(
                "rotation.submit_timeout_seconds",
                defaults.rotation.submit_timeout_seconds,
            )?
            .set_default("notifier.kind", "log")?
            .set_default("notifier.timeout_seconds", defaults.notifier.timeout_seconds)?
            .set_default("api.bind_address", defaults.api.bind_address)?
            .set_default("api.cors_enabled", defaults.api.cors_enabled)?
            .set_default("api.cors_origins", defaults.api.cors_origins)?
            .set_default(
                "api.shutdown_timeout_seconds",
                defaults.api.shutdown_timeout_seconds,
            )?
            .set_default(
                "observability.metrics_enabled",
                defaults.observability.metrics_enabled,
            )?
            .set_default(
                "observability.metrics_endpoint",
                defaults.observability.metrics_endpoint,
            )?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("observability.log_format", defaults.observability.log_format)?)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;
        self.rotation.validate().context("轮询配置验证失败")?;
        self.notifier.validate().context("通知配置验证失败")?;
        self.api.validate().context("API配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::NotifierKind;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_keeps_rotation_settings() {
        let mut config = AppConfig::default();
        config.rotation.claim_max_attempts = 3;
        config.notifier.kind = NotifierKind::Webhook;
        config.notifier.webhook_url = Some("https://hooks.example.com/leads".to_string());

        let toml_str = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&toml_str).unwrap();

        assert_eq!(parsed.rotation.claim_max_attempts, 3);
        assert_eq!(parsed.notifier.kind, NotifierKind::Webhook);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"
max_connections = 1
min_connections = 1
connection_timeout_seconds = 5
idle_timeout_seconds = 60
run_migrations = true

[rotation]
claim_max_attempts = 4
backoff_base_ms = 1
backoff_max_ms = 10
backoff_jitter_factor = 0.0
reset_max_attempts = 2
submit_timeout_seconds = 3
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.rotation.claim_max_attempts, 4);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert_eq!(config.notifier.kind, NotifierKind::Log);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load(Some("/nonexistent/lead-rotation.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = AppConfig::from_toml("[database]\nurl = 42");
        assert!(result.is_err());
    }
}
