use crate::foundation::core::{Point, Rect, Rgba8, Viewport};
use smallvec::SmallVec;

/// Scene layer a draw op belongs to, in back-to-front order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Ground,
    StreetLight,
    Mentor,
    Judges,
    Figure,
    Vignette,
    Grain,
}

/// Geometry of a draw op, in layout pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(kurbo::Rect),
    RoundedRect(kurbo::RoundedRect),
    Circle(kurbo::Circle),
    Ellipse(kurbo::Ellipse),
    Line(kurbo::Line),
    Path(kurbo::BezPath),
}

impl Shape {
    const TOLERANCE: f64 = 0.1;

    pub fn to_path(&self) -> kurbo::BezPath {
        use kurbo::Shape as _;
        match self {
            Self::Rect(s) => s.to_path(Self::TOLERANCE),
            Self::RoundedRect(s) => s.to_path(Self::TOLERANCE),
            Self::Circle(s) => s.to_path(Self::TOLERANCE),
            Self::Ellipse(s) => s.to_path(Self::TOLERANCE),
            Self::Line(s) => s.to_path(Self::TOLERANCE),
            Self::Path(p) => p.clone(),
        }
    }

    pub fn bounding_box(&self) -> Rect {
        use kurbo::Shape as _;
        match self {
            Self::Rect(s) => s.bounding_box(),
            Self::RoundedRect(s) => s.bounding_box(),
            Self::Circle(s) => s.bounding_box(),
            Self::Ellipse(s) => s.bounding_box(),
            Self::Line(s) => s.bounding_box(),
            Self::Path(p) => p.bounding_box(),
        }
    }
}

/// One color stop of a gradient; `offset` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba8,
}

impl GradientStop {
    pub fn new(offset: f64, color: Rgba8) -> Self {
        Self { offset, color }
    }
}

pub type GradientStops = SmallVec<[GradientStop; 3]>;

/// How a shape is filled.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba8),
    /// Colors vary along the segment `start -> end` and are padded beyond it.
    Linear {
        start: Point,
        end: Point,
        stops: GradientStops,
    },
    /// Colors vary with distance from `center`, between `start_radius` and `end_radius`.
    Radial {
        center: Point,
        start_radius: f64,
        end_radius: f64,
        stops: GradientStops,
    },
}

impl Paint {
    /// Return `true` if nothing this paint draws can be visible.
    pub fn is_invisible(&self) -> bool {
        match self {
            Self::Solid(c) => c.a == 0,
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => {
                stops.iter().all(|s| s.color.a == 0)
            }
        }
    }
}

/// One entry of the display list.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Fill {
        layer: Layer,
        shape: Shape,
        paint: Paint,
        opacity: f32,
    },
    Stroke {
        layer: Layer,
        shape: Shape,
        color: Rgba8,
        width: f64,
        opacity: f32,
    },
}

impl DrawOp {
    pub fn layer(&self) -> Layer {
        match self {
            Self::Fill { layer, .. } | Self::Stroke { layer, .. } => *layer,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Self::Fill { opacity, .. } | Self::Stroke { opacity, .. } => *opacity,
        }
    }

    pub fn shape(&self) -> &Shape {
        match self {
            Self::Fill { shape, .. } | Self::Stroke { shape, .. } => shape,
        }
    }

    /// Return `true` if this op cannot produce visible pixels and should be skipped.
    pub fn is_degenerate(&self) -> bool {
        let opacity = self.opacity();
        if !(opacity.is_finite() && opacity > 0.0) {
            return true;
        }
        let bbox = self.shape().bounding_box();
        let finite = [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return true;
        }
        match self {
            Self::Fill { paint, .. } => {
                paint.is_invisible() || bbox.width() <= 0.0 || bbox.height() <= 0.0
            }
            Self::Stroke { color, width, .. } => {
                color.a == 0 || !(width.is_finite() && *width > 0.0)
            }
        }
    }
}

/// Blend mode of the full-frame overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    SoftLight,
}

/// A flat color blended over the whole finished frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay {
    pub color: Rgba8,
    pub opacity: f32,
    pub blend: BlendMode,
}

/// Everything needed to rasterize one tick of the scene.
///
/// Recomputed from scratch every tick and never read back.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneFrame {
    pub viewport: Viewport,
    pub elapsed: f64,
    pub started: bool,
    /// Back-to-front draw ops in layout pixels.
    pub ops: Vec<DrawOp>,
    pub overlay: Overlay,
}

impl SceneFrame {
    pub fn ops_in(&self, layer: Layer) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(move |op| op.layer() == layer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/frame.rs"]
mod tests;
