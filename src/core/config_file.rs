//! User configuration file handling
//!
//! Manages settings from ~/.config/bubblekern/settings.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::geometry::KerningOptions;
use crate::logging;

/// User configuration from ~/.config/bubblekern/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments.
/// Every field is optional; missing fields fall through to the default.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    /// Whether '-' may appear in unquoted strings
    pub allow_hyphen_in_bare: Option<bool>,
    pub max_component_depth: Option<usize>,
    /// Report gaps one pixel smaller so bubbles just touch
    pub subtract_one: Option<bool>,
    /// Pixels per font unit
    pub scale: Option<f64>,
    /// Hull expansion in font units
    pub expansion_distance: Option<f64>,
    /// 1 round, 2 flat, 3 square
    pub cap_style: Option<u8>,
    /// 1 round, 2 mitre, 3 bevel
    pub join_style: Option<u8>,
    pub log_to_file: Option<bool>,
}

impl ConfigFile {
    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        logging::config_dir().join("settings.json")
    }

    /// A config file with every built-in default spelled out
    pub fn with_defaults() -> Self {
        let kerning = KerningOptions::default();
        Self {
            allow_hyphen_in_bare: Some(true),
            max_component_depth: Some(kerning.max_component_depth),
            subtract_one: Some(false),
            scale: Some(kerning.scale),
            expansion_distance: Some(kerning.expansion_distance),
            cap_style: Some(kerning.cap_style.code()),
            join_style: Some(kerning.join_style.code()),
            log_to_file: Some(false),
        }
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return None;
        }
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                None
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded user settings from {:?}", path);
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Initialize the user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/bubblekern directory structure
    /// 2. A settings.json file with default values
    /// 3. A logs/ directory
    pub fn initialize_config_directory() -> Result<()> {
        let config_dir = logging::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = logging::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            Self::with_defaults().save()?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);

        Ok(())
    }
}
