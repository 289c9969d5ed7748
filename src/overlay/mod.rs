//! The floating badge next to the menu bar.
//!
//! Geometry, icon resolution and filtering are platform independent; the
//! AppKit backend that draws them is macOS only.

pub mod filter;
pub mod geometry;
pub mod icon;
pub mod presenter;

#[cfg(target_os = "macos")]
pub mod appkit;
