//! Configuration loading and management.
//!
//! Loads configuration from embedded config.toml with environment variable overrides.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::overlay::filter::{ColorControls, FilterPresets};
use crate::overlay::geometry::OverlayLayout;
use crate::overlay::icon::{AssetNaming, FallbackPolicy};

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub icons: IconsConfig,
    pub layout: OverlayLayout,
    pub filter: FilterPresets,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct AppConfig {
    pub name: String,
    pub bundle_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IconsConfig {
    #[serde(default)]
    pub resource_dir: Option<PathBuf>,
    pub asset_pattern: String,
    pub fallback_asset: String,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    #[serde(default = "default_true")]
    pub custom_assets: bool,
}

impl IconsConfig {
    /// Validated asset naming scheme.
    pub fn naming(&self) -> Result<AssetNaming, ConfigError> {
        AssetNaming::new(self.asset_pattern.clone(), self.fallback_asset.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: String,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from embedded config.toml with environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::parse(CONFIG_TOML)?;
        config.apply_overrides(|var| env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without overrides or validation.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("APPBADGE_RESOURCE_DIR").filter(|d| !d.is_empty()) {
            self.icons.resource_dir = Some(PathBuf::from(dir));
        }

        if let Some(policy) = lookup("APPBADGE_FALLBACK_POLICY") {
            self.icons.fallback_policy = policy.parse()?;
        }

        if let Some(value) = lookup("APPBADGE_CUSTOM_ASSETS") {
            self.icons.custom_assets = parse_bool("APPBADGE_CUSTOM_ASSETS", &value)?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate naming, layout and filter values.
    fn validate(&self) -> Result<(), ConfigError> {
        self.icons.naming()?;
        self.layout.validate()?;
        validate_controls(&self.filter.light)?;
        validate_controls(&self.filter.dark)?;
        Ok(())
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

fn validate_controls(controls: &ColorControls) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&controls.saturation) {
        return Err(ConfigError::InvalidFilter("saturation must be within 0..=1"));
    }
    if !(-1.0..=1.0).contains(&controls.brightness) {
        return Err(ConfigError::InvalidFilter("brightness must be within -1..=1"));
    }
    if controls.contrast < 0.0 {
        return Err(ConfigError::InvalidFilter("contrast must not be negative"));
    }
    Ok(())
}
