//! The icon presenter: one overlay, two event sources.
//!
//! The presenter is written against two small traits so the update logic is
//! independent of the windowing backend. `Workspace` answers questions about
//! the desktop (screens, frontmost app, appearance, image loading) and
//! `OverlaySurface` is the window the result is drawn into.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::IconError;
use crate::overlay::filter::{Appearance, ColorControls, FilterPresets};
use crate::overlay::geometry::{OverlayLayout, Point, ScreenGeometry};
use crate::overlay::icon::{IconResolver, IconSource};

/// The frontmost application at the moment of an activation event.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmostApplication<I> {
    pub name: Option<String>,
    pub icon: Option<I>,
}

/// What the overlay window shows.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent<I> {
    /// An asset composited inside the white rounded badge.
    Badge(I),
    /// A system icon drawn edge-to-edge with a soft shadow.
    Plain(I),
}

/// Desktop services the presenter reads from.
pub trait Workspace {
    /// Handle to a loaded image; cloning must be cheap.
    type Icon: Clone;

    fn primary_screen(&self) -> Option<ScreenGeometry>;

    fn frontmost_application(&self) -> Option<FrontmostApplication<Self::Icon>>;

    fn appearance(&self) -> Appearance;

    fn load_asset(&self, path: &Path) -> Result<Self::Icon, IconError>;

    fn filter_icon(
        &self,
        icon: &Self::Icon,
        controls: ColorControls,
    ) -> Result<Self::Icon, IconError>;
}

/// The overlay window.
pub trait OverlaySurface<I> {
    /// Create the window. Called once.
    fn install(&mut self, layout: &OverlayLayout);

    fn move_to(&mut self, origin: Point);

    /// Replace the window's content wholesale and bring it to the front.
    fn replace_content(&mut self, content: OverlayContent<I>, layout: &OverlayLayout);
}

/// Lifecycle of the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    Uninitialized,
    Running,
}

/// Keeps one overlay window showing the frontmost application's icon.
pub struct IconPresenter<W: Workspace, S: OverlaySurface<W::Icon>> {
    workspace: W,
    surface: S,
    resolver: IconResolver,
    presets: FilterPresets,
    layout: OverlayLayout,
    state: PresenterState,
}

impl<W: Workspace, S: OverlaySurface<W::Icon>> IconPresenter<W, S> {
    pub fn new(
        workspace: W,
        surface: S,
        resolver: IconResolver,
        presets: FilterPresets,
        layout: OverlayLayout,
    ) -> Self {
        Self {
            workspace,
            surface,
            resolver,
            presets,
            layout,
            state: PresenterState::Uninitialized,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PresenterState::Running
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Create the window, place it and show the current application.
    ///
    /// Returns `false` if the presenter was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("Presenter already running, ignoring start");
            return false;
        }

        self.surface.install(&self.layout);
        self.state = PresenterState::Running;
        info!(
            "Overlay installed ({}pt, policy {:?}, resources {:?})",
            self.layout.window_size,
            self.resolver.policy(),
            self.resolver.resource_dir()
        );

        self.on_screen_parameters_changed();
        let app = self.workspace.frontmost_application();
        self.on_application_activated(app);
        true
    }

    /// Move the window to the menu bar of the current primary screen.
    pub fn on_screen_parameters_changed(&mut self) {
        if !self.is_running() {
            debug!("Screen change before start, ignoring");
            return;
        }

        let Some(screen) = self.workspace.primary_screen() else {
            debug!("No primary screen, keeping overlay position");
            return;
        };

        let origin = self.layout.origin_for(&screen);
        debug!(
            "Menu bar height {}, moving overlay to ({}, {})",
            screen.menu_bar_height(),
            origin.x,
            origin.y
        );
        self.surface.move_to(origin);
    }

    /// Show the icon for a newly activated application.
    ///
    /// `None` (no frontmost application) leaves the current content alone, as
    /// does a plan in which every candidate fails to load.
    pub fn on_application_activated(&mut self, app: Option<FrontmostApplication<W::Icon>>) {
        if !self.is_running() {
            debug!("Activation before start, ignoring");
            return;
        }

        let Some(app) = app else {
            debug!("No frontmost application, keeping current icon");
            return;
        };

        let name = app.name.as_deref();
        for source in self.resolver.plan(name) {
            if let Some(content) = self.content_for(&source, &app) {
                debug!("Showing {} for {:?}", source, name.unwrap_or("<unnamed>"));
                self.surface.replace_content(content, &self.layout);
                return;
            }
        }

        warn!(
            "No icon could be produced for {:?}, keeping current icon",
            name.unwrap_or("<unnamed>")
        );
    }

    fn content_for(
        &self,
        source: &IconSource,
        app: &FrontmostApplication<W::Icon>,
    ) -> Option<OverlayContent<W::Icon>> {
        match source {
            IconSource::CustomAsset(path) | IconSource::FallbackAsset(path) => {
                match self.workspace.load_asset(path) {
                    Ok(image) => Some(OverlayContent::Badge(image)),
                    Err(e) => {
                        warn!("{}, trying next source", e);
                        None
                    }
                }
            }
            IconSource::SystemIcon => {
                let Some(icon) = app.icon.as_ref() else {
                    debug!("Application reports no icon");
                    return None;
                };
                let controls = self.presets.for_appearance(self.workspace.appearance());
                let image = match self.workspace.filter_icon(icon, controls) {
                    Ok(filtered) => filtered,
                    Err(e) => {
                        warn!("Icon filter failed ({}), showing unfiltered icon", e);
                        icon.clone()
                    }
                };
                Some(OverlayContent::Plain(image))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::geometry::Rect;
    use crate::overlay::icon::{AssetNaming, FallbackPolicy};
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::TempDir;

    /// Icons are strings: asset file contents, or the app's own icon name.
    #[derive(Default)]
    struct FakeWorkspace {
        screen: Cell<Option<ScreenGeometry>>,
        frontmost: RefCell<Option<FrontmostApplication<String>>>,
        dark: Cell<bool>,
        filter_fails: Cell<bool>,
    }

    impl Workspace for FakeWorkspace {
        type Icon = String;

        fn primary_screen(&self) -> Option<ScreenGeometry> {
            self.screen.get()
        }

        fn frontmost_application(&self) -> Option<FrontmostApplication<String>> {
            self.frontmost.borrow().clone()
        }

        fn appearance(&self) -> Appearance {
            if self.dark.get() {
                Appearance::Dark
            } else {
                Appearance::Light
            }
        }

        fn load_asset(&self, path: &Path) -> Result<String, IconError> {
            match fs::read_to_string(path) {
                Ok(content) if content != "corrupt" => Ok(content),
                _ => Err(IconError::AssetUnreadable(path.to_path_buf())),
            }
        }

        fn filter_icon(&self, icon: &String, controls: ColorControls) -> Result<String, IconError> {
            if self.filter_fails.get() {
                return Err(IconError::EmptyBitmap);
            }
            Ok(format!("{icon}@{}", controls.contrast))
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        installed: usize,
        origins: Vec<Point>,
        contents: Vec<OverlayContent<String>>,
    }

    impl FakeSurface {
        fn shown(&self) -> Option<&OverlayContent<String>> {
            self.contents.last()
        }
    }

    impl OverlaySurface<String> for FakeSurface {
        fn install(&mut self, _layout: &OverlayLayout) {
            self.installed += 1;
        }

        fn move_to(&mut self, origin: Point) {
            self.origins.push(origin);
        }

        fn replace_content(&mut self, content: OverlayContent<String>, _layout: &OverlayLayout) {
            self.contents.push(content);
        }
    }

    type TestPresenter = IconPresenter<FakeWorkspace, FakeSurface>;

    fn app(name: &str) -> Option<FrontmostApplication<String>> {
        Some(FrontmostApplication {
            name: Some(name.to_string()),
            icon: Some(format!("{name}.icns")),
        })
    }

    fn screen() -> ScreenGeometry {
        ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1728.0, 1117.0),
            Rect::new(0.0, 0.0, 1728.0, 1090.0),
        )
    }

    fn resources() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(":safari:.svg"), "safari-asset").unwrap();
        fs::write(dir.path().join("add.svg"), "fallback-asset").unwrap();
        dir
    }

    fn presenter(dir: &TempDir, policy: FallbackPolicy) -> TestPresenter {
        let workspace = FakeWorkspace::default();
        workspace.screen.set(Some(screen()));
        *workspace.frontmost.borrow_mut() = app("Finder");

        IconPresenter::new(
            workspace,
            FakeSurface::default(),
            IconResolver::new(dir.path(), AssetNaming::default(), policy, true),
            FilterPresets::default(),
            OverlayLayout::default(),
        )
    }

    #[test]
    fn test_start_installs_positions_and_renders() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        assert_eq!(presenter.state(), PresenterState::Uninitialized);

        assert!(presenter.start());
        assert_eq!(presenter.state(), PresenterState::Running);
        assert_eq!(presenter.surface().installed, 1);
        assert_eq!(presenter.surface().origins, vec![Point::new(16.0, 1092.0)]);
        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Badge("fallback-asset".to_string()))
        );

        assert!(!presenter.start());
        assert_eq!(presenter.surface().installed, 1);
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);

        presenter.on_screen_parameters_changed();
        presenter.on_application_activated(app("Safari"));

        assert!(presenter.surface().origins.is_empty());
        assert!(presenter.surface().contents.is_empty());
    }

    #[test]
    fn test_safari_then_mail() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();

        presenter.on_application_activated(app("Safari"));
        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Badge("safari-asset".to_string()))
        );

        presenter.on_application_activated(app("Mail"));
        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Badge("fallback-asset".to_string()))
        );
    }

    #[test]
    fn test_icon_depends_only_on_latest_event() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::SystemIcon);
        presenter.start();

        presenter.on_application_activated(app("Safari"));
        let first = presenter.surface().shown().cloned();
        presenter.on_application_activated(app("Mail"));
        presenter.on_application_activated(app("Terminal"));
        presenter.on_application_activated(app("Safari"));

        assert_eq!(presenter.surface().shown().cloned(), first);
    }

    #[test]
    fn test_no_frontmost_application_keeps_icon() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();
        presenter.on_application_activated(app("Safari"));
        let before = presenter.surface().contents.clone();

        presenter.on_application_activated(None);

        assert_eq!(presenter.surface().contents, before);
    }

    #[test]
    fn test_missing_screen_keeps_position() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();

        presenter.workspace().screen.set(None);
        presenter.on_screen_parameters_changed();

        assert_eq!(presenter.surface().origins.len(), 1);
    }

    #[test]
    fn test_reposition_is_idempotent() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();

        presenter.on_screen_parameters_changed();
        presenter.on_screen_parameters_changed();

        let origins = &presenter.surface().origins;
        assert_eq!(origins.len(), 3);
        assert_eq!(origins[1], origins[2]);
    }

    #[test]
    fn test_system_icon_uses_appearance_preset() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::SystemIcon);
        presenter.start();
        let presets = FilterPresets::default();

        presenter.on_application_activated(app("Mail"));
        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Plain(format!("Mail.icns@{}", presets.light.contrast)))
        );

        presenter.workspace().dark.set(true);
        presenter.on_application_activated(app("Terminal"));
        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Plain(format!("Terminal.icns@{}", presets.dark.contrast)))
        );
    }

    #[test]
    fn test_filter_failure_shows_unfiltered_icon() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::SystemIcon);
        presenter.start();
        presenter.workspace().filter_fails.set(true);

        presenter.on_application_activated(app("Mail"));

        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Plain("Mail.icns".to_string()))
        );
    }

    #[test]
    fn test_unreadable_custom_asset_degrades() {
        let dir = resources();
        fs::write(dir.path().join(":notes:.svg"), "corrupt").unwrap();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();

        presenter.on_application_activated(app("Notes"));

        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Badge("fallback-asset".to_string()))
        );
    }

    #[test]
    fn test_missing_fallback_asset_uses_system_icon() {
        let dir = resources();
        fs::remove_file(dir.path().join("add.svg")).unwrap();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();
        presenter.workspace().filter_fails.set(true);

        presenter.on_application_activated(app("Mail"));

        assert_eq!(
            presenter.surface().shown(),
            Some(&OverlayContent::Plain("Mail.icns".to_string()))
        );
    }

    #[test]
    fn test_nothing_loadable_keeps_icon() {
        let dir = resources();
        let mut presenter = presenter(&dir, FallbackPolicy::FallbackAsset);
        presenter.start();
        let before = presenter.surface().contents.clone();
        fs::remove_file(dir.path().join("add.svg")).unwrap();

        presenter.on_application_activated(Some(FrontmostApplication {
            name: Some("Mail".to_string()),
            icon: None,
        }));

        assert_eq!(presenter.surface().contents, before);
    }
}
