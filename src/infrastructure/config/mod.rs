use std::path::PathBuf;

use encoding_rs::Encoding;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "tablemerge.toml";
pub const ENV_PREFIX: &str = "TABLEMERGE_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Single-byte delimiter, or "auto" to sniff it from the content
    pub delimiter: String,

    /// Trim whitespace around cells
    pub trim: bool,

    /// Encoding label used when the input is neither BOM-tagged nor UTF-8
    pub fallback_encoding: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            trim: false,
            fallback_encoding: "windows-1252".to_string(),
        }
    }
}

impl CsvConfig {
    /// `None` means detect per upload
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        if self.delimiter.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        match self.delimiter.as_bytes() {
            [b] => Ok(Some(*b)),
            _ => Err(AppError::ConfigError(format!(
                "csv.delimiter must be a single byte or \"auto\", got {:?}",
                self.delimiter
            ))),
        }
    }

    pub fn fallback(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.fallback_encoding.as_bytes()).ok_or_else(|| {
            AppError::ConfigError(format!(
                "unknown csv.fallback_encoding: {}",
                self.fallback_encoding
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    pub collision_suffix: String,
    pub preview_rows: usize,
    pub output_file_name: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            collision_suffix: "_r".to_string(),
            preview_rows: 5,
            output_file_name: "merged_output.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub demo_email: String,
    pub demo_password: String,
    pub demo_name: String,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            demo_email: "demo@project.com".to_string(),
            demo_password: "Dashboard123".to_string(),
            demo_name: "Demo User".to_string(),
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Defaults, then `tablemerge.toml`, then `TABLEMERGE_*` variables
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.merge.collision_suffix.is_empty() {
            return Err(AppError::ConfigError(
                "merge.collision_suffix must not be empty".to_string(),
            ));
        }
        if self.merge.preview_rows == 0 {
            return Err(AppError::ConfigError(
                "merge.preview_rows must be > 0".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }
        if self.merge.output_file_name.trim().is_empty() {
            return Err(AppError::ConfigError(
                "merge.output_file_name must not be empty".to_string(),
            ));
        }
        self.csv.delimiter_byte()?;
        self.csv.fallback()?;
        Ok(())
    }
}
