use smallvec::SmallVec;

use crate::foundation::core::{Affine, Canvas, Rect, Rgba8};
use crate::render::FrameRGBA;
use crate::scene::frame::{BlendMode, DrawOp, GradientStop, Overlay, Paint, SceneFrame, Shape};

/// CPU rasterizer for [`SceneFrame`] display lists, backed by `vello_cpu`.
///
/// Rasterization never fails: ops with degenerate geometry are skipped, and a surface that
/// cannot be allocated yields a transparent frame. The flicker overlay is drawn last, inside a
/// blend layer covering the whole canvas.
#[derive(Clone, Debug)]
pub struct CpuRasterizer {
    max_surface_dim: u32,
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self {
            max_surface_dim: Self::MAX_SURFACE_DIM,
        }
    }
}

impl CpuRasterizer {
    /// Largest surface edge, in device pixels.
    pub const MAX_SURFACE_DIM: u32 = 8192;

    pub fn new() -> Self {
        Self::default()
    }

    /// Use a smaller surface limit (clamped to `1..=MAX_SURFACE_DIM`).
    pub fn with_max_surface_dim(max_surface_dim: u32) -> Self {
        Self {
            max_surface_dim: max_surface_dim.clamp(1, Self::MAX_SURFACE_DIM),
        }
    }

    pub fn max_surface_dim(&self) -> u32 {
        self.max_surface_dim
    }

    /// Rasterize `frame` into premultiplied RGBA8 at the viewport's device pixel size.
    pub fn render(&self, frame: &SceneFrame) -> FrameRGBA {
        let size = frame.viewport.pixel_size();
        let clamped = Canvas {
            width: size.width.clamp(1, self.max_surface_dim),
            height: size.height.clamp(1, self.max_surface_dim),
        };
        if clamped != size {
            tracing::warn!(
                width = size.width,
                height = size.height,
                max = self.max_surface_dim,
                "surface size out of range; emitting transparent frame"
            );
            return FrameRGBA::transparent(clamped.width, clamped.height);
        }
        // `max_surface_dim` never exceeds u16::MAX.
        let (Ok(w), Ok(h)) = (u16::try_from(size.width), u16::try_from(size.height)) else {
            return FrameRGBA::transparent(clamped.width, clamped.height);
        };

        let layout = Rect::new(
            0.0,
            0.0,
            f64::from(frame.viewport.canvas.width),
            f64::from(frame.viewport.canvas.height),
        );
        let to_pixels = affine_to_cpu(frame.viewport.to_pixels());

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let mut drawn = 0usize;
        for (index, op) in frame.ops.iter().enumerate() {
            if op.is_degenerate() {
                tracing::trace!(index, layer = ?op.layer(), "skipping degenerate op");
                continue;
            }
            draw_op(&mut ctx, op, to_pixels);
            drawn += 1;
        }
        draw_overlay(&mut ctx, &frame.overlay, layout, to_pixels);
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        tracing::trace!(drawn, total = frame.ops.len(), "frame rasterized");

        FrameRGBA {
            width: size.width,
            height: size.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

/// Rasterize one frame with the default rasterizer.
pub fn rasterize(frame: &SceneFrame) -> FrameRGBA {
    CpuRasterizer::default().render(frame)
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp, to_pixels: vello_cpu::kurbo::Affine) {
    ctx.set_transform(to_pixels);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::Fill {
            shape,
            paint,
            opacity,
            ..
        } => {
            set_paint(ctx, paint);
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.fill_path(&bezpath_to_cpu(shape));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
        }
        DrawOp::Stroke {
            shape,
            color,
            width,
            opacity,
            ..
        } => {
            ctx.set_paint(color_to_cpu(*color));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.stroke_path(&bezpath_to_cpu(shape));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
        }
    }
}

/// Gradients are specified in layout space, so the current transform carries them to device
/// pixels along with the geometry.
fn set_paint(ctx: &mut vello_cpu::RenderContext, paint: &Paint) {
    match paint {
        Paint::Solid(c) => ctx.set_paint(color_to_cpu(*c)),
        Paint::Linear { start, end, stops } => {
            let stops = stops_to_cpu(stops);
            let gradient =
                vello_cpu::peniko::Gradient::new_linear(point_to_cpu(*start), point_to_cpu(*end))
                    .with_stops(stops.as_slice());
            ctx.set_paint(gradient);
        }
        Paint::Radial {
            center,
            start_radius,
            end_radius,
            stops,
        } => {
            let stops = stops_to_cpu(stops);
            let c = point_to_cpu(*center);
            let gradient = vello_cpu::peniko::Gradient::new_two_point_radial(
                c,
                *start_radius as f32,
                c,
                *end_radius as f32,
            )
            .with_stops(stops.as_slice());
            ctx.set_paint(gradient);
        }
    }
}

fn draw_overlay(
    ctx: &mut vello_cpu::RenderContext,
    overlay: &Overlay,
    layout: Rect,
    to_pixels: vello_cpu::kurbo::Affine,
) {
    if overlay.color.a == 0 || !(overlay.opacity.is_finite() && overlay.opacity > 0.0) {
        return;
    }
    let mix = match overlay.blend {
        BlendMode::Normal => vello_cpu::peniko::Mix::Normal,
        BlendMode::SoftLight => vello_cpu::peniko::Mix::SoftLight,
    };
    ctx.set_transform(to_pixels);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color_to_cpu(overlay.color));

    ctx.push_blend_layer(vello_cpu::peniko::BlendMode::new(
        mix,
        vello_cpu::peniko::Compose::SrcOver,
    ));
    ctx.push_opacity_layer(overlay.opacity.min(1.0));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        layout.x0, layout.y0, layout.x1, layout.y1,
    ));
    ctx.pop_layer();
    ctx.pop_layer();
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn stops_to_cpu(stops: &[GradientStop]) -> SmallVec<[vello_cpu::peniko::ColorStop; 3]> {
    stops
        .iter()
        .map(|s| vello_cpu::peniko::ColorStop::from((s.offset as f32, color_to_cpu(s.color))))
        .collect()
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(shape: &Shape) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let path = shape.to_path();
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
