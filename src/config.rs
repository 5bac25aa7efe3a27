//! Configuration file support for reportdeck
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./reportdeck.toml` - current directory
//! 3. `~/.config/reportdeck/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! dpi = 300
//! threads = 4
//!
//! [detection]
//! darkness_threshold = 153
//! top_trim_percent = 0.16
//! bottom_trim_percent = 0.05
//!
//! [layout]
//! canvas_width_in = 10.0
//! canvas_height_in = 6.0
//! title_band_in = 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::layout::SlideCanvas;
use crate::pipeline::DeckConfig;

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Rasterization DPI
    #[serde(default)]
    pub dpi: Option<u32>,

    /// Number of threads for the batch map
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Content band detection options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// Darkness threshold (0-255)
    #[serde(default)]
    pub darkness_threshold: Option<u8>,

    /// Separator row dark fraction (0.0-1.0)
    #[serde(default)]
    pub row_dark_fraction: Option<f32>,

    /// Template trim from the top of the page
    #[serde(default)]
    pub top_trim_percent: Option<f32>,

    /// Template trim from the bottom of the page
    #[serde(default)]
    pub bottom_trim_percent: Option<f32>,

    /// Field marker preceding the test item label
    #[serde(default)]
    pub label_keyword: Option<String>,
}

/// Slide layout options, in inches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Usable canvas width
    #[serde(default)]
    pub canvas_width_in: Option<f64>,

    /// Usable canvas height below the title band
    #[serde(default)]
    pub canvas_height_in: Option<f64>,

    /// Title band height
    #[serde(default)]
    pub title_band_in: Option<f64>,
}

/// Output options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Skip inputs whose deck already exists
    #[serde(default)]
    pub skip_existing: Option<bool>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Layout settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./reportdeck.toml`
    /// 2. `~/.config/reportdeck/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        let current_dir_config = PathBuf::from("reportdeck.toml");
        if current_dir_config.exists() {
            return Self::load_from_path(&current_dir_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reportdeck").join("config.toml");
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Convert to DeckConfig
    pub fn to_deck_config(&self) -> DeckConfig {
        let mut config = DeckConfig::default();

        if let Some(dpi) = self.general.dpi {
            config = config.with_dpi(dpi);
        }
        config.threads = self.general.threads;

        if let Some(threshold) = self.detection.darkness_threshold {
            config = config.with_darkness_threshold(threshold);
        }
        if let Some(fraction) = self.detection.row_dark_fraction {
            config.row_dark_fraction = fraction.clamp(0.0, 1.0);
        }
        let top = self
            .detection
            .top_trim_percent
            .unwrap_or(config.top_trim_percent);
        let bottom = self
            .detection
            .bottom_trim_percent
            .unwrap_or(config.bottom_trim_percent);
        config = config.with_template_trim(top, bottom);
        if let Some(keyword) = &self.detection.label_keyword {
            config = config.with_label_keyword(keyword.clone());
        }

        let default_canvas = SlideCanvas::default();
        let width = self.layout.canvas_width_in;
        let height = self.layout.canvas_height_in;
        let band = self.layout.title_band_in;
        if width.is_some() || height.is_some() || band.is_some() {
            config.canvas = SlideCanvas::from_inches(
                width.unwrap_or(default_canvas.width / crate::layout::EMU_PER_INCH),
                height.unwrap_or(default_canvas.height / crate::layout::EMU_PER_INCH),
                band.unwrap_or(default_canvas.title_band / crate::layout::EMU_PER_INCH),
            );
        }

        config
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> DeckConfig {
        let mut config = self.to_deck_config();

        if let Some(dpi) = cli.dpi {
            config = config.with_dpi(dpi);
        }
        if let Some(threshold) = cli.darkness_threshold {
            config = config.with_darkness_threshold(threshold);
        }
        let top = cli.top_trim_percent.unwrap_or(config.top_trim_percent);
        let bottom = cli.bottom_trim_percent.unwrap_or(config.bottom_trim_percent);
        config = config.with_template_trim(top, bottom);
        if let Some(keyword) = &cli.label_keyword {
            config = config.with_label_keyword(keyword.clone());
        }
        if cli.threads.is_some() {
            config.threads = cli.threads;
        }
        if cli.max_pages.is_some() {
            config = config.with_max_pages(cli.max_pages);
        }

        config
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("reportdeck.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("reportdeck").join("config.toml"));
        }

        paths
    }
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dpi: Option<u32>,
    pub darkness_threshold: Option<u8>,
    pub top_trim_percent: Option<f32>,
    pub bottom_trim_percent: Option<f32>,
    pub label_keyword: Option<String>,
    pub threads: Option<usize>,
    pub max_pages: Option<usize>,
}

impl CliOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }
}
