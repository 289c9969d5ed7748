//! Icon asset naming and resolution.
//!
//! Every activation is resolved from scratch into an ordered plan of
//! candidate sources; the presenter shows the first candidate that produces
//! an image.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Placeholder substituted with the lowercased application name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// What to show when no custom asset exists for the frontmost application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// The bundled generic asset, inside the badge.
    #[default]
    FallbackAsset,
    /// The application's own icon, filtered for the current appearance.
    SystemIcon,
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback_asset" | "fallback" => Ok(Self::FallbackAsset),
            "system_icon" | "system" => Ok(Self::SystemIcon),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }
}

/// One candidate for the overlay's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Application-specific asset from the resource directory.
    CustomAsset(PathBuf),
    /// The icon the OS reports for the application.
    SystemIcon,
    /// The generic bundled asset.
    FallbackAsset(PathBuf),
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomAsset(path) => write!(f, "custom asset {}", path.display()),
            Self::SystemIcon => f.write_str("system icon"),
            Self::FallbackAsset(path) => write!(f, "fallback asset {}", path.display()),
        }
    }
}

/// File names of assets in the resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNaming {
    pattern: String,
    fallback: String,
}

impl AssetNaming {
    pub fn new(
        pattern: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        let fallback = fallback.into();
        if pattern.trim().is_empty() {
            return Err(ConfigError::EmptyAssetName("asset_pattern"));
        }
        if !pattern.contains(NAME_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(pattern));
        }
        if fallback.trim().is_empty() {
            return Err(ConfigError::EmptyAssetName("fallback_asset"));
        }
        Ok(Self { pattern, fallback })
    }

    /// Asset file name for an application, or `None` when the name cannot
    /// form a file name inside the resource directory.
    pub fn asset_file_name(&self, app_name: &str) -> Option<String> {
        let name = app_name.trim().to_lowercase();
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return None;
        }
        Some(self.pattern.replace(NAME_PLACEHOLDER, &name))
    }

    pub fn fallback_file_name(&self) -> &str {
        &self.fallback
    }
}

impl Default for AssetNaming {
    fn default() -> Self {
        Self {
            pattern: format!(":{NAME_PLACEHOLDER}:.svg"),
            fallback: "add.svg".to_string(),
        }
    }
}

/// Maps an application name to the ordered list of sources to try.
#[derive(Debug, Clone)]
pub struct IconResolver {
    resource_dir: PathBuf,
    naming: AssetNaming,
    policy: FallbackPolicy,
    custom_assets: bool,
}

impl IconResolver {
    pub fn new(
        resource_dir: impl Into<PathBuf>,
        naming: AssetNaming,
        policy: FallbackPolicy,
        custom_assets: bool,
    ) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            naming,
            policy,
            custom_assets,
        }
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Path the custom asset for `app_name` would have.
    pub fn custom_asset_path(&self, app_name: &str) -> Option<PathBuf> {
        self.naming
            .asset_file_name(app_name)
            .map(|file| self.resource_dir.join(file))
    }

    pub fn fallback_asset_path(&self) -> PathBuf {
        self.resource_dir.join(self.naming.fallback_file_name())
    }

    /// Candidates for `app_name`, best first.
    ///
    /// Only the custom tier depends on the filesystem; both remaining tiers
    /// are always present so a failed load can degrade to the other.
    pub fn plan(&self, app_name: Option<&str>) -> Vec<IconSource> {
        let mut plan = Vec::with_capacity(3);

        if self.custom_assets {
            if let Some(path) = app_name.and_then(|name| self.custom_asset_path(name)) {
                if path.is_file() {
                    plan.push(IconSource::CustomAsset(path));
                } else {
                    debug!("No custom asset at {:?}", path);
                }
            }
        }

        let fallback = IconSource::FallbackAsset(self.fallback_asset_path());
        match self.policy {
            FallbackPolicy::FallbackAsset => {
                plan.push(fallback);
                plan.push(IconSource::SystemIcon);
            }
            FallbackPolicy::SystemIcon => {
                plan.push(IconSource::SystemIcon);
                plan.push(fallback);
            }
        }

        plan
    }

    /// Preferred source for `app_name`.
    #[allow(dead_code)]
    pub fn resolve(&self, app_name: Option<&str>) -> IconSource {
        // plan() always ends with both policy tiers
        self.plan(app_name)
            .into_iter()
            .next()
            .unwrap_or(IconSource::SystemIcon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resources(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "<svg/>").unwrap();
        }
        dir
    }

    fn resolver(dir: &TempDir, policy: FallbackPolicy) -> IconResolver {
        IconResolver::new(dir.path(), AssetNaming::default(), policy, true)
    }

    #[test]
    fn test_asset_file_name() {
        let naming = AssetNaming::default();
        assert_eq!(naming.asset_file_name("Safari").as_deref(), Some(":safari:.svg"));
        assert_eq!(
            naming.asset_file_name("Visual Studio Code").as_deref(),
            Some(":visual studio code:.svg")
        );
        assert_eq!(naming.asset_file_name(""), None);
        assert_eq!(naming.asset_file_name("../etc"), None);
        assert_eq!(naming.asset_file_name(".."), None);
    }

    #[test]
    fn test_naming_validation() {
        assert!(AssetNaming::new("{name}.png", "default.png").is_ok());
        assert!(matches!(
            AssetNaming::new("icon.svg", "add.svg"),
            Err(ConfigError::MissingPlaceholder(_))
        ));
        assert!(AssetNaming::new("", "add.svg").is_err());
        assert!(AssetNaming::new("{name}.svg", " ").is_err());
    }

    #[test]
    fn test_custom_asset_wins() {
        let dir = resources(&[":safari:.svg", "add.svg"]);
        for policy in [FallbackPolicy::FallbackAsset, FallbackPolicy::SystemIcon] {
            let source = resolver(&dir, policy).resolve(Some("Safari"));
            assert_eq!(source, IconSource::CustomAsset(dir.path().join(":safari:.svg")));
        }
    }

    #[test]
    fn test_safari_then_mail() {
        let dir = resources(&[":safari:.svg", "add.svg"]);
        let resolver = resolver(&dir, FallbackPolicy::FallbackAsset);

        assert_eq!(
            resolver.resolve(Some("Safari")),
            IconSource::CustomAsset(dir.path().join(":safari:.svg"))
        );
        assert_eq!(
            resolver.resolve(Some("Mail")),
            IconSource::FallbackAsset(dir.path().join("add.svg"))
        );
    }

    #[test]
    fn test_plan_order_per_policy() {
        let dir = resources(&["add.svg"]);
        let fallback = IconSource::FallbackAsset(dir.path().join("add.svg"));

        assert_eq!(
            resolver(&dir, FallbackPolicy::FallbackAsset).plan(Some("Mail")),
            vec![fallback.clone(), IconSource::SystemIcon]
        );
        assert_eq!(
            resolver(&dir, FallbackPolicy::SystemIcon).plan(Some("Mail")),
            vec![IconSource::SystemIcon, fallback]
        );
    }

    #[test]
    fn test_custom_assets_disabled() {
        let dir = resources(&[":safari:.svg", "add.svg"]);
        let resolver = IconResolver::new(
            dir.path(),
            AssetNaming::default(),
            FallbackPolicy::FallbackAsset,
            false,
        );
        assert!(matches!(
            resolver.resolve(Some("Safari")),
            IconSource::FallbackAsset(_)
        ));
    }

    #[test]
    fn test_unnamed_application_skips_custom_tier() {
        let dir = resources(&["::.svg", "add.svg"]);
        let resolver = resolver(&dir, FallbackPolicy::SystemIcon);
        assert_eq!(resolver.resolve(None), IconSource::SystemIcon);
        assert_eq!(resolver.resolve(Some("")), IconSource::SystemIcon);
    }

    #[test]
    fn test_directory_named_like_asset_is_ignored() {
        let dir = resources(&["add.svg"]);
        fs::create_dir(dir.path().join(":finder:.svg")).unwrap();
        assert!(matches!(
            resolver(&dir, FallbackPolicy::FallbackAsset).resolve(Some("Finder")),
            IconSource::FallbackAsset(_)
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "system_icon".parse::<FallbackPolicy>().unwrap(),
            FallbackPolicy::SystemIcon
        );
        assert_eq!(
            " Fallback_Asset ".parse::<FallbackPolicy>().unwrap(),
            FallbackPolicy::FallbackAsset
        );
        assert!("none".parse::<FallbackPolicy>().is_err());
    }
}
