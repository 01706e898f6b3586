use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::service::{ServiceCatalog, VideoServiceDescriptor};
use crate::{Result, ScreenError};

const BUILTIN_CONFIG: &str = include_str!("service/builtin.toml");
const CONFIG_FILE_NAME: &str = "cinescreen.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub screen: ScreenConfig,
    /// Empty means "use the built-in services".
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "ScreenConfig::default_volume")]
    pub default_volume: f32,
}

impl ScreenConfig {
    fn default_volume() -> f32 {
        0.5
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            default_volume: Self::default_volume(),
        }
    }
}

/// One `[[services]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    pub url: String,
    pub set_volume_js: String,
    pub start_js: String,
    #[serde(default)]
    pub seek_js: String,
    #[serde(default)]
    pub live_state_js: String,
}

impl ServiceConfig {
    pub fn descriptor(&self) -> Result<VideoServiceDescriptor> {
        VideoServiceDescriptor::new(
            self.id.as_str(),
            &self.url,
            &self.set_volume_js,
            &self.start_js,
            &self.seek_js,
            &self.live_state_js,
        )
        .map_err(|e| ScreenError::Config(format!("service {}: {}", self.id, e)))
    }
}

impl Config {
    fn default_log_filter() -> String {
        "info".to_string()
    }

    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CONFIG)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// `cinescreen.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "cinescreen", "cinescreen")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// The user's config file if there is one, otherwise the built-in config.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                info!("No {} found, using built-in services", CONFIG_FILE_NAME);
                Self::builtin()
            }
        }
    }

    /// Build a catalog from the configured services, or from the built-in
    /// ones when none are configured.
    pub fn catalog(&self) -> Result<ServiceCatalog> {
        let catalog = ServiceCatalog::new();

        let builtin;
        let services = if self.services.is_empty() {
            builtin = Self::builtin()?;
            &builtin.services
        } else {
            &self.services
        };

        for service in services {
            catalog.register(service.descriptor()?)?;
        }

        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let volume = self.screen.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(ScreenError::Config(format!(
                "screen.default_volume must be within 0.0..=1.0, got {volume}"
            )));
        }

        Ok(())
    }
}
