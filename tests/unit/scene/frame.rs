use super::*;
use smallvec::smallvec;

#[test]
fn degenerate_ops_are_detected() {
    let unit = Shape::Rect(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));
    let op = |shape: Shape, paint: Paint, opacity: f32| DrawOp::Fill {
        layer: Layer::Figure,
        shape,
        paint,
        opacity,
    };
    let red = Paint::Solid(Rgba8::rgb(255, 0, 0));

    assert!(!op(unit.clone(), red.clone(), 1.0).is_degenerate());
    assert!(op(unit.clone(), red.clone(), 0.0).is_degenerate());
    assert!(op(unit.clone(), red.clone(), f32::NAN).is_degenerate());
    assert!(op(unit.clone(), Paint::Solid(Rgba8::rgba(1, 2, 3, 0.0)), 1.0).is_degenerate());
    assert!(op(Shape::Rect(kurbo::Rect::new(0.0, 0.0, 0.0, 10.0)), red.clone(), 1.0).is_degenerate());
    assert!(
        op(
            Shape::Circle(kurbo::Circle::new((f64::NAN, 0.0), 3.0)),
            red,
            1.0
        )
        .is_degenerate()
    );

    let line = DrawOp::Stroke {
        layer: Layer::StreetLight,
        shape: Shape::Line(kurbo::Line::new((0.0, 0.0), (0.0, 10.0))),
        color: Rgba8::rgb(1, 1, 1),
        width: 2.0,
        opacity: 1.0,
    };
    assert!(!line.is_degenerate(), "zero-width bbox is fine for strokes");
}

#[test]
fn empty_stops_are_transparent() {
    let paint = Paint::Linear {
        start: Point::new(0.0, 0.0),
        end: Point::new(1.0, 0.0),
        stops: GradientStops::new(),
    };
    assert!(paint.is_invisible());

    let faded = Paint::Radial {
        center: Point::new(0.0, 0.0),
        start_radius: 0.0,
        end_radius: 10.0,
        stops: smallvec![
            GradientStop::new(0.0, Rgba8::rgba(10, 10, 10, 0.0)),
            GradientStop::new(1.0, Rgba8::rgba(10, 10, 10, 0.2)),
        ],
    };
    assert!(!faded.is_invisible());
}
