use super::*;
use crate::foundation::core::{Rgba8, Viewport};
use crate::scene::compose::compose_frame;
use crate::scene::frame::{BlendMode, GradientStop, Layer, Overlay};

fn small_viewport(dpr: f64) -> Viewport {
    Viewport::new(Canvas::widescreen(640), dpr, Viewport::MAX_DPR)
}

#[test]
fn frame_matches_device_pixel_size() {
    let frame = rasterize(&compose_frame(small_viewport(1.0), 1.0, true, 40));
    assert_eq!((frame.width, frame.height), (640, 360));
    assert_eq!(frame.data.len(), 640 * 360 * 4);
    assert!(frame.premultiplied);

    let frame = rasterize(&compose_frame(small_viewport(2.0), 1.0, true, 40));
    assert_eq!((frame.width, frame.height), (1280, 720));
}

#[test]
fn scene_is_opaque_everywhere() {
    let frame = rasterize(&compose_frame(small_viewport(1.0), 2.5, false, 40));
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn street_light_glows() {
    let frame = rasterize(&compose_frame(small_viewport(1.0), 0.0, true, 0));
    let lit = frame.pixel(490, 110).unwrap();
    let dark = frame.pixel(40, 110).unwrap();
    assert!(lit[0] > dark[0] + 40, "lit {lit:?} dark {dark:?}");
}

#[test]
fn degenerate_ops_are_skipped() {
    let mut scene = compose_frame(small_viewport(1.0), 0.0, false, 0);
    let reference = rasterize(&scene);
    scene.ops.push(DrawOp::Fill {
        layer: Layer::Grain,
        shape: Shape::Circle(kurbo::Circle::new((f64::NAN, 3.0), 10.0)),
        paint: Paint::Solid(Rgba8::rgb(255, 0, 0)),
        opacity: 1.0,
    });
    scene.ops.push(DrawOp::Fill {
        layer: Layer::Grain,
        shape: Shape::Rect(kurbo::Rect::new(0.0, 0.0, 50.0, 50.0)),
        paint: Paint::Solid(Rgba8::rgb(255, 0, 0)),
        opacity: 0.0,
    });
    assert_eq!(rasterize(&scene), reference);
}

#[test]
fn offscreen_gradient_is_skipped() {
    let mut scene = compose_frame(small_viewport(1.0), 0.0, false, 0);
    let reference = rasterize(&scene);
    scene.ops.push(DrawOp::Fill {
        layer: Layer::Vignette,
        shape: Shape::Rect(kurbo::Rect::new(5000.0, 5000.0, 5100.0, 5100.0)),
        paint: Paint::Radial {
            center: kurbo::Point::new(5050.0, 5050.0),
            start_radius: 0.0,
            end_radius: 50.0,
            stops: smallvec::smallvec![
                GradientStop::new(0.0, Rgba8::rgb(255, 0, 0)),
                GradientStop::new(1.0, Rgba8::rgb(0, 0, 255)),
            ],
        },
        opacity: 1.0,
    });
    assert_eq!(rasterize(&scene), reference);
}

#[test]
fn oversized_surface_yields_transparent_frame() {
    let scene = compose_frame(small_viewport(1.0), 0.0, false, 0);
    let frame = CpuRasterizer::with_max_surface_dim(100).render(&scene);
    assert_eq!((frame.width, frame.height), (100, 100));
    assert!(frame.data.iter().all(|b| *b == 0));
}

#[test]
fn overlay_is_applied_last() {
    let mut scene = compose_frame(small_viewport(1.0), 0.0, false, 0);
    scene.ops.clear();
    scene.overlay = Overlay {
        color: Rgba8::rgb(255, 0, 0),
        opacity: 1.0,
        blend: BlendMode::Normal,
    };
    let frame = rasterize(&scene);
    assert_eq!(frame.pixel(10, 10), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(640, 0), None);
}

fn blank_scene(dpr: f64) -> SceneFrame {
    let mut scene = compose_frame(small_viewport(dpr), 0.0, false, 0);
    scene.ops.clear();
    scene.overlay.opacity = 0.0;
    scene
}

fn fill(shape: kurbo::Rect, paint: Paint) -> DrawOp {
    DrawOp::Fill {
        layer: Layer::Background,
        shape: Shape::Rect(shape),
        paint,
        opacity: 1.0,
    }
}

fn black_to_white() -> crate::scene::frame::GradientStops {
    smallvec::smallvec![
        GradientStop::new(0.0, Rgba8::rgb(0, 0, 0)),
        GradientStop::new(1.0, Rgba8::rgb(255, 255, 255)),
    ]
}

#[test]
fn linear_gradient_follows_its_axis() {
    let mut scene = blank_scene(1.0);
    scene.ops.push(fill(
        kurbo::Rect::new(0.0, 0.0, 640.0, 360.0),
        Paint::Linear {
            start: kurbo::Point::new(0.0, 0.0),
            end: kurbo::Point::new(0.0, 360.0),
            stops: black_to_white(),
        },
    ));
    let frame = rasterize(&scene);

    let top = frame.pixel(320, 0).unwrap();
    let bottom = frame.pixel(320, 359).unwrap();
    assert!(top[0] < 10, "top {top:?}");
    assert!(bottom[0] > 245, "bottom {bottom:?}");
    assert_eq!(top[3], 255);

    let column: Vec<u8> = (0..360).map(|y| frame.pixel(320, y).unwrap()[0]).collect();
    assert!(column.windows(2).all(|w| w[0] <= w[1]), "column is not monotonic");
}

#[test]
fn gradients_resolve_at_device_resolution() {
    let mut scene = blank_scene(2.0);
    scene.ops.push(fill(
        kurbo::Rect::new(0.0, 0.0, 640.0, 360.0),
        Paint::Linear {
            start: kurbo::Point::new(0.0, 0.0),
            end: kurbo::Point::new(0.0, 8.0),
            stops: black_to_white(),
        },
    ));
    let frame = rasterize(&scene);

    // 8 layout pixels span 16 device rows; each row gets its own shade.
    let mut shades: Vec<u8> = (0..16).map(|y| frame.pixel(40, y).unwrap()[0]).collect();
    shades.dedup();
    assert!(shades.len() >= 12, "shades {shades:?}");
}

#[test]
fn radial_gradient_fades_outward() {
    let mut scene = blank_scene(1.0);
    scene.ops.push(fill(
        kurbo::Rect::new(0.0, 0.0, 640.0, 360.0),
        Paint::Radial {
            center: kurbo::Point::new(320.0, 180.0),
            start_radius: 0.0,
            end_radius: 150.0,
            stops: smallvec::smallvec![
                GradientStop::new(0.0, Rgba8::rgb(255, 255, 255)),
                GradientStop::new(1.0, Rgba8::rgb(0, 0, 0)),
            ],
        },
    ));
    let frame = rasterize(&scene);

    let center = frame.pixel(320, 180).unwrap()[0];
    let mid = frame.pixel(395, 180).unwrap()[0];
    let outside = frame.pixel(600, 20).unwrap()[0];
    assert!(center > 245, "center {center}");
    assert!(mid > 90 && mid < 165, "mid {mid}");
    assert!(outside < 5, "outside {outside}");
}

fn gray_under(overlay: Rgba8, opacity: f32) -> [u8; 4] {
    let mut scene = blank_scene(1.0);
    scene.ops.push(fill(
        kurbo::Rect::new(0.0, 0.0, 640.0, 360.0),
        Paint::Solid(Rgba8::rgb(128, 128, 128)),
    ));
    scene.overlay = Overlay {
        color: overlay,
        opacity,
        blend: BlendMode::SoftLight,
    };
    rasterize(&scene).pixel(200, 200).unwrap()
}

#[test]
fn soft_light_overlay_lightens_and_darkens() {
    let lighter = gray_under(Rgba8::rgb(255, 255, 255), 1.0);
    let darker = gray_under(Rgba8::rgb(0, 0, 0), 1.0);
    assert!(lighter[0] > 165, "lighter {lighter:?}");
    assert!(darker[0] < 90, "darker {darker:?}");
    assert_eq!(lighter[3], 255);
    assert_eq!(darker[3], 255);

    // Half opacity lands between the backdrop and the full-strength blend.
    let half = gray_under(Rgba8::rgb(255, 255, 255), 0.5);
    assert!(half[0] > 133 && half[0] < lighter[0], "half {half:?}");
}

#[test]
fn invisible_overlay_leaves_frame_untouched() {
    let unchanged = gray_under(Rgba8::rgb(255, 255, 255), 0.0);
    assert!((127..=129).contains(&unchanged[0]), "{unchanged:?}");
    let clear = gray_under(Rgba8::rgba(255, 255, 255, 0.0), 1.0);
    assert_eq!(clear, unchanged);
}
