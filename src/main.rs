//! AppBadge - macOS Menu Bar Accessory
//!
//! Shows the icon of the frontmost application in a small floating badge
//! next to the menu bar.

#![deny(clippy::all)]

#[cfg(target_os = "macos")]
mod app;
mod config;
mod error;
mod overlay;
mod settings;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;

fn main() {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        // .env file is optional - only log if it's not a "file not found" error
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            init_logging("info", "appbadge");
            error!("Failed to load configuration: {}", e);
            eprintln!("Configuration error: {}", e);
            eprintln!("\nCheck config.toml and the APPBADGE_* environment variables.");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level, &config.logging.log_dir);

    info!("Starting {} v{}", config.app.name, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(default_level: &str, log_dir: &str) {
    // Create log directory
    if let Err(e) = settings::init_log_directory(log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
    }

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

/// Install the app delegate and run the AppKit event loop.
#[cfg(target_os = "macos")]
fn run(config: Config) -> Result<()> {
    use anyhow::Context;
    use objc2::runtime::ProtocolObject;
    use objc2_app_kit::NSApplication;
    use objc2_foundation::MainThreadMarker;

    use app::delegate::AppDelegate;
    use overlay::appkit::MenuBarIconPresenter;

    // Must run on main thread for AppKit
    let mtm = MainThreadMarker::new().context("AppKit must run on the main thread")?;

    let presenter =
        MenuBarIconPresenter::new(mtm, &config).context("Failed to set up the icon presenter")?;

    // Get shared NSApplication
    let ns_app = NSApplication::sharedApplication(mtm);

    // The delegate owns the presenter and starts it once launching finishes
    let delegate = AppDelegate::new(mtm, presenter);
    ns_app.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));

    info!("Starting application event loop");

    // Run the application event loop (blocks until app quits)
    unsafe {
        ns_app.run();
    }

    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run(config: Config) -> Result<()> {
    anyhow::bail!("{} requires macOS", config.app.name)
}
