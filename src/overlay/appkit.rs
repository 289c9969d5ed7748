//! AppKit backend for the icon presenter.
//!
//! Provides the overlay window, the badge views and the two notification
//! observers that drive the presenter. Everything here runs on the main
//! thread.

use std::cell::RefCell;
use std::path::Path;
use std::ptr::NonNull;
use std::rc::{Rc, Weak};

use block2::RcBlock;
use objc2::msg_send;
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy,
    NSApplicationDidChangeScreenParametersNotification, NSBackingStoreType, NSBox, NSColor,
    NSImage, NSImageView, NSScreen, NSShadow, NSView, NSWindow, NSWindowCollectionBehavior,
    NSWindowLevel, NSWindowStyleMask, NSWorkspace, NSWorkspaceDidActivateApplicationNotification,
};
use objc2_foundation::{
    MainThreadMarker, NSData, NSNotification, NSNotificationCenter, NSNotificationName,
    NSObjectProtocol, NSPoint, NSRect, NSSize, NSString,
};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ConfigError, IconError};
use crate::overlay::filter::{filter_encoded, Appearance, ColorControls};
use crate::overlay::geometry::{OverlayLayout, Point, Rect, ScreenGeometry};
use crate::overlay::icon::IconResolver;
use crate::overlay::presenter::{
    FrontmostApplication, IconPresenter, OverlayContent, OverlaySurface, PresenterState,
    Workspace,
};
use crate::settings;

/// `kCGStatusWindowLevel`.
const STATUS_WINDOW_LEVEL: NSWindowLevel = 25;

/// `NSBoxCustom`.
const BOX_TYPE_CUSTOM: usize = 4;
/// `NSNoTitle`.
const TITLE_POSITION_NONE: usize = 0;
/// `NSImageScaleProportionallyDown`.
const SCALE_PROPORTIONALLY_DOWN: usize = 0;
/// `NSImageScaleProportionallyUpOrDown`.
const SCALE_PROPORTIONALLY_UP_OR_DOWN: usize = 3;

type Core = IconPresenter<AppKitWorkspace, AppKitOverlay>;

fn ns_rect(rect: Rect) -> NSRect {
    NSRect::new(
        NSPoint::new(rect.origin.x, rect.origin.y),
        NSSize::new(rect.width, rect.height),
    )
}

fn from_ns_rect(frame: NSRect) -> Rect {
    Rect::new(frame.origin.x, frame.origin.y, frame.size.width, frame.size.height)
}

/// Desktop state read through `NSWorkspace`, `NSScreen` and `NSApplication`.
pub struct AppKitWorkspace {
    mtm: MainThreadMarker,
}

impl AppKitWorkspace {
    pub fn new(mtm: MainThreadMarker) -> Self {
        Self { mtm }
    }
}

impl Workspace for AppKitWorkspace {
    type Icon = Retained<NSImage>;

    fn primary_screen(&self) -> Option<ScreenGeometry> {
        let screen = unsafe { NSScreen::mainScreen(self.mtm) }?;
        let (frame, visible) = unsafe { (screen.frame(), screen.visibleFrame()) };
        Some(ScreenGeometry::new(from_ns_rect(frame), from_ns_rect(visible)))
    }

    fn frontmost_application(&self) -> Option<FrontmostApplication<Retained<NSImage>>> {
        unsafe {
            let app = NSWorkspace::sharedWorkspace().frontmostApplication()?;
            Some(FrontmostApplication {
                name: app.localizedName().map(|name| name.to_string()),
                icon: app.icon(),
            })
        }
    }

    fn appearance(&self) -> Appearance {
        let app = NSApplication::sharedApplication(self.mtm);
        let name = unsafe { app.effectiveAppearance().name() };
        Appearance::from_name(&name.to_string())
    }

    fn load_asset(&self, path: &Path) -> Result<Retained<NSImage>, IconError> {
        let ns_path = NSString::from_str(&path.to_string_lossy());
        unsafe { NSImage::initWithContentsOfFile(NSImage::alloc(), &ns_path) }
            .ok_or_else(|| IconError::AssetUnreadable(path.to_path_buf()))
    }

    fn filter_icon(
        &self,
        icon: &Retained<NSImage>,
        controls: ColorControls,
    ) -> Result<Retained<NSImage>, IconError> {
        let tiff = unsafe { icon.TIFFRepresentation() }.ok_or(IconError::MissingRepresentation)?;
        let png = filter_encoded(tiff.bytes(), controls)?;

        let data = NSData::with_bytes(&png);
        let filtered = unsafe { NSImage::initWithData(NSImage::alloc(), &data) }
            .ok_or(IconError::Rejected)?;
        // Keep the unfiltered icon's point size, not the bitmap's pixel size.
        unsafe { filtered.setSize(icon.size()) };
        Ok(filtered)
    }
}

/// The borderless, click-through overlay window.
pub struct AppKitOverlay {
    mtm: MainThreadMarker,
    window: Option<Retained<NSWindow>>,
}

impl AppKitOverlay {
    pub fn new(mtm: MainThreadMarker) -> Self {
        Self { mtm, window: None }
    }
}

impl OverlaySurface<Retained<NSImage>> for AppKitOverlay {
    fn install(&mut self, layout: &OverlayLayout) {
        if self.window.is_some() {
            return;
        }

        let window = unsafe {
            let window = NSWindow::initWithContentRect_styleMask_backing_defer(
                self.mtm.alloc(),
                ns_rect(layout.window_rect()),
                NSWindowStyleMask::Borderless,
                NSBackingStoreType::NSBackingStoreBuffered,
                false,
            );
            window.setReleasedWhenClosed(false);
            window.setLevel(STATUS_WINDOW_LEVEL);
            window.setBackgroundColor(Some(&NSColor::clearColor()));
            window.setOpaque(false);
            window.setHasShadow(false);
            window.setIgnoresMouseEvents(true);
            window.setCollectionBehavior(
                NSWindowCollectionBehavior::CanJoinAllSpaces
                    | NSWindowCollectionBehavior::Transient,
            );
            window
        };

        self.window = Some(window);
    }

    fn move_to(&mut self, origin: Point) {
        if let Some(window) = &self.window {
            unsafe { window.setFrameOrigin(NSPoint::new(origin.x, origin.y)) };
        }
    }

    fn replace_content(
        &mut self,
        content: OverlayContent<Retained<NSImage>>,
        layout: &OverlayLayout,
    ) {
        let Some(window) = &self.window else {
            return;
        };

        let view = match content {
            OverlayContent::Badge(image) => badge_view(self.mtm, &image, layout),
            OverlayContent::Plain(image) => plain_view(self.mtm, &image, layout),
        };

        unsafe {
            window.setContentView(Some(&view));
            window.orderFront(None);
        }
    }
}

fn shadow(alpha: f64, offset_y: f64, blur: f64) -> Retained<NSShadow> {
    unsafe {
        let shadow = NSShadow::new();
        shadow.setShadowColor(Some(&NSColor::blackColor().colorWithAlphaComponent(alpha)));
        shadow.setShadowOffset(NSSize::new(0.0, offset_y));
        shadow.setShadowBlurRadius(blur);
        shadow
    }
}

fn image_view(
    mtm: MainThreadMarker,
    image: &NSImage,
    frame: Rect,
    scaling: usize,
) -> Retained<NSImageView> {
    unsafe {
        let view = NSImageView::initWithFrame(mtm.alloc(), ns_rect(frame));
        let _: () = msg_send![&*view, setImageScaling: scaling];
        view.setImage(Some(image));
        view
    }
}

/// Asset inside a white rounded badge, centred in the window.
fn badge_view(mtm: MainThreadMarker, image: &NSImage, layout: &OverlayLayout) -> Retained<NSView> {
    unsafe {
        let wrapper = NSView::initWithFrame(mtm.alloc(), ns_rect(layout.window_rect()));

        let badge = NSBox::initWithFrame(mtm.alloc(), ns_rect(layout.badge_rect()));
        let _: () = msg_send![&*badge, setBoxType: BOX_TYPE_CUSTOM];
        let _: () = msg_send![&*badge, setTitlePosition: TITLE_POSITION_NONE];
        badge.setBorderWidth(0.0);
        badge.setCornerRadius(layout.badge_corner_radius);
        badge.setFillColor(&NSColor::whiteColor());
        badge.setWantsLayer(true);
        badge.setShadow(Some(&shadow(0.25, -0.5, 0.5)));

        let icon = image_view(mtm, image, layout.image_rect(), SCALE_PROPORTIONALLY_DOWN);
        badge.addSubview(&icon);
        wrapper.addSubview(&badge);
        wrapper
    }
}

/// System icon filling the window, with a soft shadow and no badge.
fn plain_view(mtm: MainThreadMarker, image: &NSImage, layout: &OverlayLayout) -> Retained<NSView> {
    unsafe {
        let wrapper = NSView::initWithFrame(mtm.alloc(), ns_rect(layout.window_rect()));

        let icon = image_view(mtm, image, layout.window_rect(), SCALE_PROPORTIONALLY_UP_OR_DOWN);
        icon.setWantsLayer(true);
        icon.setShadow(Some(&shadow(0.3, -1.0, 2.0)));
        wrapper.addSubview(&icon);
        wrapper
    }
}

/// Run `f` against the presenter if it is still alive and not already busy.
fn with_core(core: &Weak<RefCell<Core>>, f: impl FnOnce(&mut Core)) {
    let Some(core) = core.upgrade() else {
        debug!("Presenter dropped, ignoring notification");
        return;
    };

    if let Ok(mut core) = core.try_borrow_mut() {
        f(&mut *core);
    } else {
        debug!("Presenter busy, ignoring re-entrant notification");
    };
}

/// The long-lived context object: owns the presenter and its observers.
pub struct MenuBarIconPresenter {
    mtm: MainThreadMarker,
    core: Rc<RefCell<Core>>,
    /// Observer tokens; retained so the subscriptions stay registered.
    observers: Vec<Retained<ProtocolObject<dyn NSObjectProtocol>>>,
}

impl MenuBarIconPresenter {
    pub fn new(mtm: MainThreadMarker, config: &Config) -> Result<Self, ConfigError> {
        let resource_dir = settings::resource_directory(config.icons.resource_dir.as_deref());
        let resolver = IconResolver::new(
            resource_dir,
            config.icons.naming()?,
            config.icons.fallback_policy,
            config.icons.custom_assets,
        );

        let core = IconPresenter::new(
            AppKitWorkspace::new(mtm),
            AppKitOverlay::new(mtm),
            resolver,
            config.filter,
            config.layout,
        );

        Ok(Self {
            mtm,
            core: Rc::new(RefCell::new(core)),
            observers: Vec::new(),
        })
    }

    /// Hide from the Dock, show the overlay and subscribe to updates.
    pub fn start(&mut self) {
        if self.core.borrow().state() == PresenterState::Running {
            warn!("Menu bar presenter already started");
            return;
        }

        let app = NSApplication::sharedApplication(self.mtm);
        app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

        self.core.borrow_mut().start();

        let (workspace_center, default_center) = unsafe {
            (
                NSWorkspace::sharedWorkspace().notificationCenter(),
                NSNotificationCenter::defaultCenter(),
            )
        };
        let (activated, screen_changed) = unsafe {
            (
                NSWorkspaceDidActivateApplicationNotification,
                NSApplicationDidChangeScreenParametersNotification,
            )
        };

        self.observe(&workspace_center, activated, |core| {
            let app = core.workspace().frontmost_application();
            core.on_application_activated(app);
        });
        self.observe(&default_center, screen_changed, |core| {
            core.on_screen_parameters_changed()
        });

        info!("Menu bar presenter running with {} observers", self.observers.len());
    }

    /// Subscribe `handler` to `name`. The block only holds a weak reference
    /// to the presenter.
    fn observe(
        &mut self,
        center: &NSNotificationCenter,
        name: &NSNotificationName,
        handler: fn(&mut Core),
    ) {
        let core = Rc::downgrade(&self.core);
        let block = RcBlock::new(move |_notification: NonNull<NSNotification>| {
            with_core(&core, handler);
        });

        let token = unsafe {
            center.addObserverForName_object_queue_usingBlock(Some(name), None, None, &block)
        };
        debug!("Observing {}", name);
        self.observers.push(token);
    }
}
