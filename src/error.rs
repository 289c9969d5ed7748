//! Error types for the appbadge application.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. The only failures that stop the app from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown fallback policy: {0:?} (expected \"fallback_asset\" or \"system_icon\")")]
    InvalidPolicy(String),

    #[error("Invalid boolean for {var}: {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    EmptyAssetName(&'static str),

    #[error("Asset pattern {0:?} has no {{name}} placeholder")]
    MissingPlaceholder(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(&'static str),

    #[error("Invalid filter preset: {0}")]
    InvalidFilter(&'static str),
}

/// Icon loading and filtering errors.
///
/// None of these reach the user: each one makes the presenter fall back to a
/// lower-fidelity icon.
#[derive(Error, Debug)]
pub enum IconError {
    #[error("Asset could not be loaded: {0}")]
    AssetUnreadable(PathBuf),

    #[error("Icon has no bitmap representation")]
    MissingRepresentation,

    #[error("Failed to decode icon bitmap: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode filtered icon: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Icon bitmap is empty")]
    EmptyBitmap,

    #[error("Filtered bitmap was rejected by the image loader")]
    Rejected,
}
