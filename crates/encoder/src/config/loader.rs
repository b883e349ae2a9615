use std::path::Path;

use crate::config::schema::{EncoderConfig, ToolkitConfig};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub const ENV_INPUT_BUCKET: &str = "INPUT_BUCKET_NAME";
pub const ENV_OUTPUT_BUCKET: &str = "OUTPUT_BUCKET_NAME";
pub const ENV_LOCAL_STORAGE_PATH: &str = "LOCAL_STORAGE_PATH";
pub const ENV_CONCURRENCY: &str = "CONCURRENCY_UPLOAD";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EncoderConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<EncoderConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: EncoderConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Builds a config from process environment variables.
///
/// This is the only place the crate reads the environment; everything
/// downstream receives the resulting value.
pub fn load_config_from_env() -> Result<EncoderConfig, ConfigError> {
    let concurrency = match std::env::var(ENV_CONCURRENCY) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidValue {
                name: ENV_CONCURRENCY.to_string(),
                reason: e.to_string(),
            })?,
        Err(_) => num_cpus::get(),
    };

    let config = EncoderConfig {
        version: "1.0".to_string(),
        input_bucket: required_env(ENV_INPUT_BUCKET)?,
        output_bucket: required_env(ENV_OUTPUT_BUCKET)?,
        local_storage_path: required_env(ENV_LOCAL_STORAGE_PATH)?,
        concurrency,
        database_path: std::env::var(ENV_DATABASE_PATH).ok(),
        toolkit: ToolkitConfig::default(),
    };

    validate_config(&config)?;
    Ok(config)
}

impl EncoderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_config_from_env()
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &EncoderConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    for (name, value) in [
        ("input_bucket", &config.input_bucket),
        ("output_bucket", &config.output_bucket),
        ("local_storage_path", &config.local_storage_path),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{} must not be empty", name),
            });
        }
    }

    if config.concurrency == 0 {
        return Err(ConfigError::Validation {
            message: "concurrency must be at least 1".to_string(),
        });
    }

    Ok(())
}
