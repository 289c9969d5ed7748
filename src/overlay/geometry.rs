//! Menu-bar geometry for the overlay window.
//!
//! Coordinates follow the AppKit convention: origin at the bottom-left of the
//! primary screen, y growing upwards, all values in points.

use serde::Deserialize;

use crate::error::ConfigError;

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    /// Square of `side` centered inside `self`, in `self`'s local coordinates.
    pub fn centered_square(&self, side: f64) -> Rect {
        Rect::new(
            (self.width - side) / 2.0,
            (self.height - side) / 2.0,
            side,
            side,
        )
    }
}

/// Full and visible frame of the primary screen, as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub frame: Rect,
    pub visible_frame: Rect,
}

impl ScreenGeometry {
    pub fn new(frame: Rect, visible_frame: Rect) -> Self {
        Self {
            frame,
            visible_frame,
        }
    }

    /// Height of the strip the menu bar occupies at the top of the screen.
    ///
    /// The visible frame excludes both the menu bar and the Dock, so the Dock's
    /// share (the visible frame's inset from the bottom edge) is taken out
    /// again. The final point is the menu bar's bottom hairline.
    pub fn menu_bar_height(&self) -> f64 {
        let dock_inset = self.visible_frame.min_y() - self.frame.min_y();
        self.frame.height - self.visible_frame.height - dock_inset - 1.0
    }
}

/// Fixed sizes and offsets of the overlay window and its badge.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverlayLayout {
    /// Side of the square overlay window.
    pub window_size: f64,
    /// Side of the white rounded badge drawn behind custom assets.
    pub badge_size: f64,
    pub badge_corner_radius: f64,
    /// Side of the asset image inside the badge.
    pub image_size: f64,
    /// Distance from the screen's left edge to the window.
    pub horizontal_inset: f64,
    /// Subtracted from the menu-bar centre line to get the window's bottom edge.
    pub vertical_adjustment: f64,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            window_size: 24.0,
            badge_size: 19.0,
            badge_corner_radius: 4.5,
            image_size: 14.0,
            horizontal_inset: 16.0,
            vertical_adjustment: 12.0,
        }
    }
}

impl OverlayLayout {
    /// Reject sizes that cannot produce a visible badge.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size <= 0.0 {
            return Err(ConfigError::InvalidLayout("window_size must be positive"));
        }
        if self.badge_size <= 0.0 || self.badge_size > self.window_size {
            return Err(ConfigError::InvalidLayout(
                "badge_size must be positive and fit inside the window",
            ));
        }
        if self.image_size <= 0.0 || self.image_size > self.badge_size {
            return Err(ConfigError::InvalidLayout(
                "image_size must be positive and fit inside the badge",
            ));
        }
        if self.badge_corner_radius < 0.0 {
            return Err(ConfigError::InvalidLayout(
                "badge_corner_radius must not be negative",
            ));
        }
        Ok(())
    }

    /// Content rect of the window, positioned at the origin.
    pub fn window_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.window_size, self.window_size)
    }

    /// Badge frame in window coordinates.
    pub fn badge_rect(&self) -> Rect {
        self.window_rect().centered_square(self.badge_size)
    }

    /// Asset image frame in badge coordinates.
    pub fn image_rect(&self) -> Rect {
        self.badge_rect().centered_square(self.image_size)
    }

    /// Window origin that puts the overlay just right of the screen's left
    /// edge, vertically centred on the menu bar.
    pub fn origin_for(&self, screen: &ScreenGeometry) -> Point {
        let frame = &screen.frame;
        let x = frame.min_x() + self.horizontal_inset;
        let y = frame.min_y() + frame.height
            - screen.menu_bar_height() / 2.0
            - self.vertical_adjustment;
        Point::new(x, y)
    }
}
