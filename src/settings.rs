//! Persisted LumenSigner settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{CHUNK_SIZE, FRAME_INTERVAL_MS};
use crate::errors::AppError;
use crate::path::BipPath;
use crate::request::Network;

pub const SETTINGS_ENV: &str = "LUMENSIGNER_SETTINGS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenSignerSettings {
    pub bip_path: BipPath,
    pub network: Network,
    pub chunk_size: usize,
    pub frame_interval_ms: u64,
}

impl Default for LumenSignerSettings {
    fn default() -> Self {
        Self {
            bip_path: BipPath::default(),
            network: Network::default(),
            chunk_size: CHUNK_SIZE,
            frame_interval_ms: FRAME_INTERVAL_MS,
        }
    }
}

impl LumenSignerSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Settings("chunk_size must be greater than zero".to_string()));
        }
        if self.frame_interval_ms == 0 {
            return Err(AppError::Settings(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.bip_path.is_stellar_account() {
            warn!(path = %self.bip_path, "path is not a Stellar account path, the device will not answer it");
        }
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&text)
            .map_err(|e| AppError::Settings(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        debug!(file = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), AppError> {
        let text = toml::to_string_pretty(self).map_err(|e| AppError::Settings(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// File named by `LUMENSIGNER_SETTINGS`, if set.
    pub fn env_path() -> Option<PathBuf> {
        std::env::var_os(SETTINGS_ENV).map(PathBuf::from)
    }

    /// Settings from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            _ => Ok(Self::default()),
        }
    }
}
