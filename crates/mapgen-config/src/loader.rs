use std::fs;
use std::path::Path;

use crate::{Config, ConfigError};

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content).map_err(|source| ConfigError::Toml {
        path: "<inline>".into(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    tracing::info!(
        path = %path.display(),
        source_systems = config.source_systems.len(),
        extra_fields = config.extra_fields.len(),
        "loaded generator config"
    );
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    for field in &config.predefined.target {
        let mandatory = field.mandatory.trim().to_lowercase();
        if mandatory != "null" && mandatory != "not null" {
            return Err(ConfigError::Invalid {
                message: format!(
                    "predefined target field `{}` has mandatory `{}` (expected null or not null)",
                    field.name, field.mandatory
                ),
            });
        }
    }
    let extras = &config.extra_fields;
    for (idx, extra) in extras.iter().enumerate() {
        let overlapping = extras[idx + 1..].iter().any(|other| {
            other.name == extra.name
                && match (extra.capture_mode, other.capture_mode) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
        });
        if overlapping {
            return Err(ConfigError::Invalid {
                message: format!(
                    "extra field `{}` is defined more than once for the same capture mode",
                    extra.name
                ),
            });
        }
    }
    Ok(())
}
