//! Appearance-keyed color filtering of system icons.
//!
//! Icons are desaturated and then brightness/contrast adjusted with one of
//! two presets, picked solely by the current light/dark appearance.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Deserialize;

use crate::error::IconError;

/// Rec. 709 luma weights.
const LUMA: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// OS-wide light or dark theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Appearance {
    /// Classify an `NSAppearanceName` such as `NSAppearanceNameDarkAqua`.
    pub fn from_name(name: &str) -> Self {
        if name.contains("Dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

/// Saturation, brightness and contrast applied per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorControls {
    /// 0 is fully grey, 1 leaves colors untouched.
    pub saturation: f32,
    /// Added to each channel, in the 0..1 channel range.
    pub brightness: f32,
    /// Scale around mid-grey; 1 leaves contrast untouched.
    pub contrast: f32,
}

impl ColorControls {
    /// Apply to a single RGBA pixel; alpha is kept.
    pub fn apply_pixel(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        let rgb = [r, g, b].map(|c| f32::from(c) / 255.0);
        let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
        let out = rgb.map(|c| {
            let saturated = luma + (c - luma) * self.saturation;
            let bright = saturated + self.brightness;
            let contrasted = (bright - 0.5) * self.contrast + 0.5;
            (contrasted.clamp(0.0, 1.0) * 255.0).round() as u8
        });
        [out[0], out[1], out[2], a]
    }

    pub fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            pixel.0 = self.apply_pixel(pixel.0);
        }
    }
}

/// One set of controls per appearance.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FilterPresets {
    pub light: ColorControls,
    pub dark: ColorControls,
}

impl Default for FilterPresets {
    fn default() -> Self {
        Self {
            light: ColorControls {
                saturation: 0.0,
                brightness: -0.05,
                contrast: 1.1,
            },
            dark: ColorControls {
                saturation: 0.0,
                brightness: 0.1,
                contrast: 0.9,
            },
        }
    }
}

impl FilterPresets {
    pub fn for_appearance(&self, appearance: Appearance) -> ColorControls {
        match appearance {
            Appearance::Light => self.light,
            Appearance::Dark => self.dark,
        }
    }
}

/// Decode an encoded bitmap (TIFF, PNG, ...), filter it and re-encode as PNG.
pub fn filter_encoded(bytes: &[u8], controls: ColorControls) -> Result<Vec<u8>, IconError> {
    let mut image = image::load_from_memory(bytes)
        .map_err(IconError::Decode)?
        .into_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(IconError::EmptyBitmap);
    }

    controls.apply(&mut image);

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(IconError::Encode)?;
    Ok(out)
}
