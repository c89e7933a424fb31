use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::model::ModelRole;

pub const DEFAULT_CONFIG_FILE: &str = "membrane.toml";
pub const ENV_PREFIX: &str = "MEMBRANE_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelPaths,
    pub ui: UiConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where each role's artifact lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPaths {
    pub rejection: PathBuf,
    pub permeability: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub title: String,
    pub show_debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
        }
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            rejection: PathBuf::from("models/cat.onnx"),
            permeability: PathBuf::from("models/gbm.onnx"),
        }
    }
}

impl ModelPaths {
    pub fn for_role(&self, role: ModelRole) -> &Path {
        match role {
            ModelRole::Rejection => &self.rejection,
            ModelRole::Permeability => &self.permeability,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Membrane Performance Prediction".to_string(),
            show_debug: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: ModelPaths::default(),
            ui: UiConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> Result<tracing::Level, figment::Error> {
        tracing::Level::from_str(self.log_level.trim())
            .map_err(|_| figment::Error::from(format!("invalid log_level '{}'", self.log_level)))
    }
}

/// Load configuration: defaults, then the TOML file, then `MEMBRANE_*`
/// environment variables (`__` separates nested keys).
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, figment::Error> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let figment = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: AppConfig = figment.extract()?;

    for role in ModelRole::ALL {
        if config.models.for_role(role).as_os_str().is_empty() {
            return Err(figment::Error::from(format!(
                "models.{} path must be set",
                role.title().to_lowercase()
            )));
        }
    }
    config.log_level()?;

    Ok(config)
}
