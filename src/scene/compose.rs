use crate::foundation::core::{Point, Rect, Rgba8, Vec2, Viewport};
use crate::foundation::math::hash_unit;
use crate::scene::frame::{
    BlendMode, DrawOp, GradientStop, Layer, Overlay, Paint, SceneFrame, Shape,
};
use crate::scene::palette;
use smallvec::smallvec;
use std::f64::consts::PI;

const GROUND_HEIGHT: f64 = 160.0;
const GLOW_RADIUS: f64 = 240.0;
const JUDGE_COUNT: usize = 5;
const JUDGE_OPACITY: f32 = 0.55;
const GRAIN_OPACITY: f32 = 0.05;
const FLICKER_OPACITY: f64 = 0.25;
const GRAIN_SEED: u64 = 0x6e69_6768_7477_6f72;

/// Build the display list for one tick.
///
/// A pure function of its arguments: the same inputs always produce the same frame. `started`
/// only changes the flicker overlay; the scene itself is drawn either way.
pub fn compose_frame(viewport: Viewport, elapsed: f64, started: bool, grain_dots: u32) -> SceneFrame {
    let t = if elapsed.is_finite() { elapsed } else { 0.0 };
    let w = f64::from(viewport.canvas.width);
    let h = f64::from(viewport.canvas.height);

    let mut ops = Vec::with_capacity(48 + grain_dots as usize);
    background(&mut ops, w, h);

    let light = Point::new(w * 0.78, h * 0.36 + (t * 3.0).sin() * 1.5);
    street_light(&mut ops, light);
    mentor(&mut ops, t, Point::new(light.x - 30.0, h - 210.0));
    judges(&mut ops, t * 0.7);
    figure(&mut ops, t, Point::new(w * 0.35 + (t * 0.4).sin() * 8.0, h - 230.0));
    vignette(&mut ops, w, h);
    grain(&mut ops, t, w, h, grain_dots);

    SceneFrame {
        viewport,
        elapsed: t,
        started,
        ops,
        overlay: flicker_overlay(t, started),
    }
}

/// Flicker overlay opacity: modulated by `sin(8t)` once started, constant before.
pub fn flicker_opacity(elapsed: f64, started: bool) -> f32 {
    let flicker = if started {
        0.96 + (elapsed * 8.0).sin() * 0.03
    } else {
        1.0
    };
    (FLICKER_OPACITY * flicker) as f32
}

fn flicker_overlay(t: f64, started: bool) -> Overlay {
    Overlay {
        color: palette::GOLD,
        opacity: flicker_opacity(t, started),
        blend: BlendMode::SoftLight,
    }
}

fn fill(layer: Layer, shape: Shape, paint: Paint) -> DrawOp {
    DrawOp::Fill {
        layer,
        shape,
        paint,
        opacity: 1.0,
    }
}

fn solid(layer: Layer, shape: Shape, color: Rgba8) -> DrawOp {
    fill(layer, shape, Paint::Solid(color))
}

fn circle(c: Point, r: f64) -> Shape {
    Shape::Circle(kurbo::Circle::new(c, r))
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape::Rect(Rect::new(x, y, x + w, y + h))
}

fn rounded(x: f64, y: f64, w: f64, h: f64, r: f64) -> Shape {
    Shape::RoundedRect(kurbo::RoundedRect::new(x, y, x + w, y + h, r))
}

fn background(ops: &mut Vec<DrawOp>, w: f64, h: f64) {
    ops.push(fill(
        Layer::Background,
        rect(0.0, 0.0, w, h),
        Paint::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, h),
            stops: smallvec![
                GradientStop::new(0.0, palette::BACKGROUND_TOP),
                GradientStop::new(1.0, palette::BACKGROUND_BOTTOM),
            ],
        },
    ));
    ops.push(solid(
        Layer::Ground,
        rect(0.0, h - GROUND_HEIGHT, w, GROUND_HEIGHT),
        palette::GROUND,
    ));
}

fn street_light(ops: &mut Vec<DrawOp>, p: Point) {
    ops.push(fill(
        Layer::StreetLight,
        circle(p, GLOW_RADIUS),
        Paint::Radial {
            center: p,
            start_radius: 10.0,
            end_radius: GLOW_RADIUS,
            stops: smallvec![
                GradientStop::new(0.0, palette::gold(0.9)),
                GradientStop::new(0.4, palette::gold(0.35)),
                GradientStop::new(1.0, palette::gold(0.0)),
            ],
        },
    ));
    let lamp = p + Vec2::new(60.0, -30.0);
    for (to, width) in [(p + Vec2::new(0.0, 280.0), 6.0), (lamp, 3.0)] {
        ops.push(DrawOp::Stroke {
            layer: Layer::StreetLight,
            shape: Shape::Line(kurbo::Line::new(p, to)),
            color: palette::MID,
            width,
            opacity: 1.0,
        });
    }
    ops.push(solid(Layer::StreetLight, circle(lamp, 8.0), palette::GOLD));
}

fn mentor(ops: &mut Vec<DrawOp>, t: f64, p: Point) {
    ops.push(solid(
        Layer::Mentor,
        rounded(p.x - 26.0, p.y - 10.0, 52.0, 92.0, 12.0),
        palette::MENTOR_BODY,
    ));
    let head_r = 20.0 + (t * 1.2).sin() * 0.8;
    ops.push(solid(
        Layer::Mentor,
        circle(Point::new(p.x, p.y - 16.0), head_r),
        palette::MENTOR_HEAD,
    ));
}

/// `phase` is already slowed (`0.7t`); each judge is offset by its index.
fn judges(ops: &mut Vec<DrawOp>, phase: f64) {
    for i in 0..JUDGE_COUNT {
        let fi = i as f64;
        let jx = 80.0 + fi * 220.0 + (phase + fi).sin() * 6.0;
        let jy = 180.0 + (i % 2) as f64 * 10.0;
        let mut push = |shape, color| {
            ops.push(DrawOp::Fill {
                layer: Layer::Judges,
                shape,
                paint: Paint::Solid(color),
                opacity: JUDGE_OPACITY,
            })
        };
        push(circle(Point::new(jx, jy), 22.0), palette::JUDGE_HEAD);
        push(rect(jx - 18.0, jy + 18.0, 36.0, 60.0), palette::MID);
        if i % 2 == 0 {
            ops.push(DrawOp::Stroke {
                layer: Layer::Judges,
                shape: Shape::Ellipse(kurbo::Ellipse::new(
                    Point::new(jx + 28.0, jy - 18.0),
                    Vec2::new(22.0, 12.0),
                    0.0,
                )),
                color: palette::SPEECH_OVAL,
                width: 2.0,
                opacity: JUDGE_OPACITY,
            });
        }
    }
}

fn figure(ops: &mut Vec<DrawOp>, t: f64, p: Point) {
    let (x, y) = (p.x, p.y);
    let breath = (t * 2.0).sin() * 4.0;

    ops.push(solid(Layer::Figure, rect(x - 120.0, y + 40.0, 260.0, 18.0), palette::MID));
    ops.push(solid(
        Layer::Figure,
        rounded(x - 30.0, y + breath, 60.0, 70.0, 10.0),
        palette::FIGURE_BODY,
    ));
    ops.push(solid(
        Layer::Figure,
        circle(Point::new(x, y - 10.0 + breath * 0.3), 24.0),
        palette::SKIN,
    ));

    // Upper half disc.
    let hair = kurbo::Arc {
        center: Point::new(x, y - 22.0 + breath * 0.3),
        radii: Vec2::new(26.0, 26.0),
        start_angle: PI,
        sweep_angle: PI,
        x_rotation: 0.0,
    };
    let mut hair_path = kurbo::BezPath::from_vec(kurbo::Shape::path_elements(&hair, 0.1).collect());
    hair_path.close_path();
    ops.push(solid(Layer::Figure, Shape::Path(hair_path), palette::HAIR));

    let ty = y + 38.0 + (t * 8.0).sin() * 3.0;
    for shape in [
        rect(x - 28.0, ty, 20.0, 8.0),
        rect(x + 8.0, ty, 20.0, 8.0),
        circle(Point::new(x - 10.0, ty + 4.0), 6.0),
        circle(Point::new(x + 28.0, ty + 4.0), 6.0),
    ] {
        ops.push(solid(Layer::Figure, shape, palette::SKIN));
    }

    ops.push(fill(
        Layer::Figure,
        rect(x - 40.0, y + 20.0, 80.0, 20.0),
        Paint::Linear {
            start: Point::new(x - 40.0, y + 20.0),
            end: Point::new(x + 40.0, y + 50.0),
            stops: smallvec![
                GradientStop::new(0.0, palette::gold(0.25)),
                GradientStop::new(1.0, palette::gold(0.08)),
            ],
        },
    ));
}

fn vignette(ops: &mut Vec<DrawOp>, w: f64, h: f64) {
    ops.push(fill(
        Layer::Vignette,
        rect(0.0, 0.0, w, h),
        Paint::Radial {
            center: Point::new(w / 2.0, h / 2.0),
            start_radius: w.min(h) * 0.2,
            end_radius: w.max(h) * 0.7,
            stops: smallvec![
                GradientStop::new(0.0, palette::TRANSPARENT_BLACK),
                GradientStop::new(1.0, Rgba8::rgba(0, 0, 0, 0.45)),
            ],
        },
    ));
}

/// Dot positions come from a hash of the elapsed time, so every tick gets fresh grain while
/// the frame stays reproducible.
fn grain(ops: &mut Vec<DrawOp>, t: f64, w: f64, h: f64, dots: u32) {
    let key = t.to_bits();
    for i in 0..u64::from(dots) {
        let gx = hash_unit(GRAIN_SEED, key, 2 * i) * w;
        let gy = hash_unit(GRAIN_SEED, key, 2 * i + 1) * h;
        ops.push(DrawOp::Fill {
            layer: Layer::Grain,
            shape: rect(gx, gy, 2.0, 2.0),
            paint: Paint::Solid(palette::GRAIN),
            opacity: GRAIN_OPACITY,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compose.rs"]
mod tests;
