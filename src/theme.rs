//! Background-driven theme derivation
//!
//! A background image is downscaled to a small sampling grid, its
//! alpha-weighted average colour is converted to HSL, and two accent colours
//! (primary and accent) are derived from that HSL. Everything here is pure:
//! decoding the image is the caller's business.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba32FImage, RgbaImage};
use serde::Serialize;
use std::fmt;

/// Side length of the square grid images are downscaled to before sampling.
pub const SAMPLE_GRID: u32 = 32;

/// Returned when an image carries no opaque pixels at all.
pub const FALLBACK_COLOR: Rgb = Rgb { r: 34, g: 40, b: 60 };

/// Hue rotation between the primary and accent colours, in degrees.
pub const ACCENT_HUE_OFFSET: f64 = 28.0;

/// An 8-bit sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// HSL colour: hue in [0, 360), saturation and lightness in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// One derived theme colour, expressed in CSS units (degrees and percents).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThemeColor {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl ThemeColor {
    /// The colour as a CSS `hsl()` value
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// The pair of colours applied to the page style
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Theme {
    pub primary: ThemeColor,
    pub accent: ThemeColor,
}

/// Alpha-weighted average colour of `image` sampled on a 32×32 grid.
///
/// Each pixel contributes its RGB weighted by `alpha / 255`. Downscaling
/// happens on premultiplied colour, so fully transparent pixels contribute
/// nothing whatever their RGB. An empty or fully transparent image yields
/// [`FALLBACK_COLOR`].
pub fn average_color(image: &DynamicImage) -> Rgb {
    if image.width() == 0 || image.height() == 0 {
        return FALLBACK_COLOR;
    }
    if image.dimensions() == (SAMPLE_GRID, SAMPLE_GRID) {
        return average_pixels(&image.to_rgba8());
    }
    average_premultiplied(&premultiplied_grid(image))
}

fn premultiplied_grid(image: &DynamicImage) -> Rgba32FImage {
    let mut rgba = image.to_rgba32f();
    for px in rgba.pixels_mut() {
        let alpha = px[3];
        px[0] *= alpha;
        px[1] *= alpha;
        px[2] *= alpha;
    }
    image::imageops::resize(&rgba, SAMPLE_GRID, SAMPLE_GRID, FilterType::Triangle)
}

fn average_premultiplied(grid: &Rgba32FImage) -> Rgb {
    let (mut r, mut g, mut b, mut weight) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

    for px in grid.pixels() {
        r += f64::from(px[0]);
        g += f64::from(px[1]);
        b += f64::from(px[2]);
        weight += f64::from(px[3]);
    }

    if weight <= 0.0 {
        return FALLBACK_COLOR;
    }

    Rgb {
        r: to_channel(r / weight * 255.0),
        g: to_channel(g / weight * 255.0),
        b: to_channel(b / weight * 255.0),
    }
}

/// Alpha-weighted average over every pixel of an already-sampled grid.
pub fn average_pixels(sample: &RgbaImage) -> Rgb {
    let (mut r, mut g, mut b, mut weight) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

    for px in sample.pixels() {
        let [pr, pg, pb, pa] = px.0;
        let alpha = f64::from(pa) / 255.0;
        r += f64::from(pr) * alpha;
        g += f64::from(pg) * alpha;
        b += f64::from(pb) * alpha;
        weight += alpha;
    }

    if weight <= 0.0 {
        return FALLBACK_COLOR;
    }

    Rgb {
        r: to_channel(r / weight),
        g: to_channel(g / weight),
        b: to_channel(b / weight),
    }
}

fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Standard RGB to HSL conversion.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let sector = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: (sector * 60.0).rem_euclid(360.0),
        s,
        l,
    }
}

/// Standard HSL to RGB conversion (inverse of [`rgb_to_hsl`]).
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let Hsl { h, s, l } = hsl;
    if s == 0.0 {
        let v = to_channel(l * 255.0);
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h.rem_euclid(360.0) / 360.0;

    Rgb {
        r: to_channel(hue_to_channel(p, q, h + 1.0 / 3.0) * 255.0),
        g: to_channel(hue_to_channel(p, q, h) * 255.0),
        b: to_channel(hue_to_channel(p, q, h - 1.0 / 3.0) * 255.0),
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Derive the primary/accent pair from a sampled colour.
pub fn derive_theme(color: Rgb) -> Theme {
    derive_theme_from_hsl(rgb_to_hsl(color.r, color.g, color.b))
}

/// Derive the primary/accent pair from an HSL sample.
///
/// Hues are rounded to whole degrees and lightness to whole percents so the
/// emitted CSS is stable; both stay inside their clamp bands.
pub fn derive_theme_from_hsl(sample: Hsl) -> Theme {
    let hue = sample.h.round().rem_euclid(360.0);
    let lightness = sample.l * 100.0;

    Theme {
        primary: ThemeColor {
            hue,
            saturation: 64.0,
            lightness: (lightness + 8.0).clamp(36.0, 64.0).round(),
        },
        accent: ThemeColor {
            hue: (hue + ACCENT_HUE_OFFSET).rem_euclid(360.0),
            saturation: 62.0,
            lightness: (lightness + 2.0).clamp(34.0, 58.0).round(),
        },
    }
}

/// Sample, convert and derive in one step.
pub fn theme_for_image(image: &DynamicImage) -> Theme {
    derive_theme(average_color(image))
}
