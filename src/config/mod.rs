pub mod toml_config;

use crate::core::convert::DEFAULT_MAX_ROWS;
use crate::core::map::{self, DEFAULT_STYLE, DEFAULT_STYLES, MAPBOX_URL_TEMPLATE};
use crate::core::{ConfigurationWarning, TileLayer};
use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::{
    validate_base_path, validate_one_of, validate_positive_number, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use toml_config::FileConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Parser)]
#[command(name = "batch-coord")]
#[command(about = "Batch coordinate converter web application")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "BATCH_COORD_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "BATCH_COORD_HOST")]
    pub host: Option<String>,

    #[arg(short, long, env = "BATCH_COORD_PORT")]
    pub port: Option<u16>,

    /// Mount the application under this path, e.g. /batch-coordinate-converter
    #[arg(long, env = "BATCH_COORD_BASE_PATH")]
    pub base_path: Option<String>,

    /// Maximum number of rows per conversion
    #[arg(long, env = "BATCH_COORD_MAX_ROWS")]
    pub max_rows: Option<usize>,

    /// Mapbox access token for the basemap tiles
    #[arg(long, env = "MAPBOX_TOKEN", hide_env_values = true)]
    pub mapbox_token: Option<String>,

    /// Google Analytics measurement id
    #[arg(long, env = "GA_MEASUREMENT_ID")]
    pub analytics_id: Option<String>,

    /// Log output format: compact or json
    #[arg(long, env = "BATCH_COORD_LOG_FORMAT")]
    pub log_format: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapConfig {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub tile_url: String,
    pub styles: Vec<String>,
    pub default_style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            token: None,
            tile_url: MAPBOX_URL_TEMPLATE.to_string(),
            styles: DEFAULT_STYLES.iter().map(|s| s.to_string()).collect(),
            default_style: DEFAULT_STYLE.to_string(),
        }
    }
}

/// 啟動時建立一次，之後以參照傳給伺服器與地圖元件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub max_rows: usize,
    pub map: MapConfig,
    pub analytics_id: Option<String>,
    pub log_format: LogFormat,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: "/".to_string(),
            max_rows: DEFAULT_MAX_ROWS,
            map: MapConfig::default(),
            analytics_id: None,
            log_format: LogFormat::default(),
            verbose: false,
        }
    }
}

/// 空字串視為未設定
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// 讀取設定檔 (若有指定) 並套用命令列與環境變數
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };
        Self::from_sources(args, &file)
    }

    /// 優先順序：命令列/環境變數 > 設定檔 > 預設值
    pub fn from_sources(args: &CliArgs, file: &FileConfig) -> Result<Self> {
        let defaults = Self::default();
        let server = file.server();
        let map = file.map();
        let logging = file.logging.clone().unwrap_or_default();

        let log_format = match non_empty(args.log_format.clone()).or(non_empty(logging.format)) {
            Some(format) => {
                validate_one_of("logging.format", &format, &["compact", "json"])?;
                if format == "json" {
                    LogFormat::Json
                } else {
                    LogFormat::Compact
                }
            }
            None => defaults.log_format,
        };

        let base_path = non_empty(args.base_path.clone())
            .or(non_empty(server.base_path))
            .unwrap_or(defaults.base_path);

        Ok(Self {
            host: non_empty(args.host.clone())
                .or(non_empty(server.host))
                .unwrap_or(defaults.host),
            port: args.port.or(server.port).unwrap_or(defaults.port),
            base_path: normalize_base_path(&base_path),
            max_rows: args.max_rows.or(server.max_rows).unwrap_or(defaults.max_rows),
            map: MapConfig {
                token: non_empty(args.mapbox_token.clone()).or(non_empty(map.token)),
                tile_url: non_empty(map.tile_url).unwrap_or(defaults.map.tile_url),
                styles: map
                    .styles
                    .filter(|s| !s.is_empty())
                    .unwrap_or(defaults.map.styles),
                default_style: non_empty(map.default_style).unwrap_or(defaults.map.default_style),
            },
            analytics_id: non_empty(args.analytics_id.clone()).or(non_empty(
                file.analytics.clone().and_then(|a| a.measurement_id),
            )),
            log_format,
            verbose: args.verbose || logging.verbose.unwrap_or(false),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConverterError::InvalidConfigValueError {
                field: "server.host".to_string(),
                value: self.host.clone(),
                reason: format!("Invalid listen address: {}", e),
            })
    }

    pub fn tile_layers(&self) -> (Vec<TileLayer>, Vec<ConfigurationWarning>) {
        map::tile_layers(
            &self.map.tile_url,
            self.map.token.as_deref(),
            &self.map.styles,
            &self.map.default_style,
        )
    }

    pub fn warnings(&self) -> Vec<ConfigurationWarning> {
        self.tile_layers().1
    }
}

/// 去除結尾斜線，根路徑保持 `/`
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        validate_base_path("server.base_path", &self.base_path)?;
        validate_positive_number("server.max_rows", self.max_rows, 1)?;
        validate_url("map.tile_url", &self.map.tile_url)?;
        validate_positive_number("map.styles", self.map.styles.len(), 1)?;

        if let Some(id) = &self.analytics_id {
            let valid = id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
            if !valid {
                return Err(ConverterError::InvalidConfigValueError {
                    field: "analytics.measurement_id".to_string(),
                    value: id.clone(),
                    reason: "Only letters, digits and '-' are allowed".to_string(),
                });
            }
        }

        if !self.map.styles.contains(&self.map.default_style) {
            return Err(ConverterError::InvalidConfigValueError {
                field: "map.default_style".to_string(),
                value: self.map.default_style.clone(),
                reason: format!("Must be one of: {}", self.map.styles.join(", ")),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["batch-coord"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(&args(&[]), &FileConfig::default()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_path, "/");
        assert_eq!(config.max_rows, 1000);
        assert_eq!(config.map.default_style, "satellite-streets-v9");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::from_toml_str(
            r#"
[server]
port = 9000
base_path = "/batch-coordinate-converter/"

[map]
token = "pk.file"
"#,
        )
        .unwrap();

        let config =
            AppConfig::from_sources(&args(&["--port", "9100", "--mapbox-token", "pk.cli"]), &file)
                .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.base_path, "/batch-coordinate-converter");
        assert_eq!(config.map.token.as_deref(), Some("pk.cli"));
    }

    #[test]
    fn test_missing_token_only_warns() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warnings(), vec![ConfigurationWarning::MissingMapToken]);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut config = AppConfig::default();
        config.max_rows = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.map.default_style = "unknown-v1".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.host = "not a host".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analytics_id = Some("G-1'><script>".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let result = AppConfig::from_sources(&args(&["--log-format", "xml"]), &FileConfig::default());
        assert!(result.is_err());
    }
}
