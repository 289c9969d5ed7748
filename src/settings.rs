//! Filesystem locations: icon resources and logs.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory icon assets are read from.
///
/// An explicit override wins. Otherwise an app bundle's `Contents/Resources`
/// (the executable lives in `Contents/MacOS`), falling back to `./resources`
/// for unbundled runs.
pub fn resource_directory(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| bundle_resources(&exe))
    {
        debug!("Using bundle resources at {:?}", dir);
        return dir;
    }

    PathBuf::from("resources")
}

/// `Contents/Resources` of the bundle containing `exe`, if there is one.
fn bundle_resources(exe: &Path) -> Option<PathBuf> {
    let macos_dir = exe.parent()?;
    if macos_dir.file_name()? != "MacOS" {
        return None;
    }
    let resources = macos_dir.parent()?.join("Resources");
    resources.is_dir().then_some(resources)
}

/// Get the path to the log directory.
pub fn log_directory(name: &str) -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join("Library/Logs").join(name)
}

/// Initialize the log directory.
pub fn init_log_directory(name: &str) -> Result<()> {
    let log_dir = log_directory(name);
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }
    Ok(())
}
