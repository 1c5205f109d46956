pub use kurbo::{Affine, Point, Rect, Vec2};

/// Logical surface dimensions in layout pixels (before device pixel ratio).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Smallest width a container may shrink the scene to.
    pub const MIN_WIDTH: u32 = 640;
    /// Width used when the container reports no usable geometry.
    pub const FALLBACK_WIDTH: u32 = 960;

    /// Build a 16:9 canvas for `width`; height is `floor(width * 9 / 16)`.
    pub fn widescreen(width: u32) -> Self {
        let height = (u64::from(width) * 9 / 16) as u32;
        Self { width, height }
    }

    /// [`Canvas::fit_container`] with the default minimum and fallback widths.
    pub fn from_container_width(container_width: Option<f64>) -> Self {
        Self::fit_container(container_width, Self::MIN_WIDTH, Self::FALLBACK_WIDTH)
    }

    /// Fit a 16:9 canvas to a container's reported width.
    ///
    /// Missing, zero, negative or non-finite geometry falls back to `fallback_width`; anything
    /// narrower than `min_width` is widened to it.
    pub fn fit_container(container_width: Option<f64>, min_width: u32, fallback_width: u32) -> Self {
        let reported = container_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .map(|w| w.floor().min(f64::from(u32::MAX)) as u32)
            .unwrap_or(fallback_width);
        Self::widescreen(reported.max(min_width))
    }

    /// Number of RGBA8 bytes needed for this canvas.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::widescreen(1280)
    }
}

/// A canvas paired with the device pixel ratio it is rasterized at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Layout size the scene is composed in.
    pub canvas: Canvas,
    /// Effective device pixel ratio (already capped).
    pub dpr: f64,
}

impl Viewport {
    /// Largest device pixel ratio honored by default.
    pub const MAX_DPR: f64 = 2.0;

    /// Create a viewport, capping `dpr` to `max_dpr` and treating unusable ratios as 1.
    pub fn new(canvas: Canvas, dpr: f64, max_dpr: f64) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let max_dpr = if max_dpr.is_finite() && max_dpr >= 1.0 {
            max_dpr
        } else {
            1.0
        };
        Self {
            canvas,
            dpr: dpr.min(max_dpr),
        }
    }

    /// Size of the backing pixel surface: `floor(layout * dpr)` on each axis.
    pub fn pixel_size(&self) -> Canvas {
        Canvas {
            width: (f64::from(self.canvas.width) * self.dpr).floor() as u32,
            height: (f64::from(self.canvas.height) * self.dpr).floor() as u32,
        }
    }

    /// Transform from layout space into pixel space.
    pub fn to_pixels(&self) -> Affine {
        Affine::scale(self.dpr)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Canvas::default(), 1.0, Self::MAX_DPR)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGB channels and a `[0, 1]` alpha.
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self::rgb(r, g, b).with_alpha(alpha)
    }

    /// Replace alpha with `alpha` in `[0, 1]` (clamped).
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
