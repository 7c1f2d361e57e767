//! Application configuration.
//!
//! Settings live in a TOML file (`swapframe.toml` by default, or the path in
//! the `SWAPFRAME_CONFIG` environment variable). Every field has a default so
//! the file, and any section of it, may be omitted.
//!
//! ```toml
//! [window]
//! width = 1024
//! height = 768
//!
//! [renderer]
//! draw_instances = 4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "swapframe.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV_VAR: &str = "SWAPFRAME_CONFIG";

/// Upper bound on instanced draws per frame.
pub const MAX_DRAW_INSTANCES: u32 = 64;

/// Window settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "swapframe".to_string(),
        }
    }
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Compiled SPIR-V vertex shader.
    pub vertex_shader: PathBuf,
    /// Compiled SPIR-V fragment shader.
    pub fragment_shader: PathBuf,
    /// Number of push-constant driven draws recorded per frame.
    pub draw_instances: u32,
    /// Enable the Khronos validation layer and debug messenger.
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/simple_shader.vert.spv"),
            fragment_shader: PathBuf::from("shaders/simple_shader.frag.spv"),
            draw_instances: 4,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
}

impl AppConfig {
    /// Loads the configuration from the default location.
    ///
    /// Uses `SWAPFRAME_CONFIG` when set, otherwise [`DEFAULT_CONFIG_FILE`].
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Loads the configuration from `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be nonzero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let instances = self.renderer.draw_instances;
        if instances == 0 || instances > MAX_DRAW_INSTANCES {
            return Err(Error::Config(format!(
                "draw_instances must be in 1..={MAX_DRAW_INSTANCES}, got {instances}"
            )));
        }

        Ok(())
    }
}
