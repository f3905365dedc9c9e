//! Runtime configuration loaded from the environment (and `.env`, if present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CONVERTER_BIN: &str = "libreoffice";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_CONCURRENT: usize = 2;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the external converter and the conversion pipeline.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub program: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
    pub isolate_profile: bool,
    pub verify_output: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_CONVERTER_BIN.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            isolate_profile: true,
            verify_output: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub work_dir: PathBuf,
    pub keep_job_files: bool,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub converter: ConverterConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let converter = ConverterConfig {
            program: get("CONVERTER_BIN").unwrap_or_else(|| DEFAULT_CONVERTER_BIN.to_string()),
            timeout: Duration::from_secs(parse_or(
                "CONVERSION_TIMEOUT_SECS",
                get("CONVERSION_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_concurrent: parse_or(
                "MAX_CONCURRENT_CONVERSIONS",
                get("MAX_CONCURRENT_CONVERSIONS"),
                DEFAULT_MAX_CONCURRENT,
            )?,
            isolate_profile: parse_bool_or(
                "ISOLATE_CONVERTER_PROFILE",
                get("ISOLATE_CONVERTER_PROFILE"),
                true,
            )?,
            verify_output: parse_bool_or("VERIFY_PDF_OUTPUT", get("VERIFY_PDF_OUTPUT"), true)?,
        };

        if converter.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "CONVERSION_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be at least one second".to_string(),
            });
        }
        if converter.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_CONCURRENT_CONVERSIONS",
                value: "0".to_string(),
                reason: "at least one conversion slot is required".to_string(),
            });
        }

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("SERVER_PORT", get("SERVER_PORT"), 8080)?,
            work_dir: get("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("office-pdf-server")),
            keep_job_files: parse_bool_or("KEEP_JOB_FILES", get("KEEP_JOB_FILES"), false)?,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            allowed_origins,
            converter,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool_or(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                reason: "expected true/false".to_string(),
            }),
        },
    }
}
