use super::*;

const EPS: f64 = 1e-9;

fn hd() -> Canvas {
    Canvas {
        width: 1920,
        height: 1080,
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
}

#[test]
fn center_maps_to_fifty_percent() {
    let t = CoordinateTransform::new(hd(), PreviewSize::new(960.0, 540.0));
    assert_eq!(t.to_preview_percent(Point::ZERO), Point::new(50.0, 50.0));
    assert_eq!(t.to_preview_percent(Point::new(960.0, -540.0)), Point::new(100.0, 0.0));
    assert_eq!(t.canvas_to_preview(Point::ZERO), Point::new(480.0, 270.0));
}

#[test]
fn percent_and_pixel_roundtrips() {
    let t = CoordinateTransform::new(hd(), PreviewSize::new(640.0, 360.0));
    for p in [
        Point::new(0.0, 0.0),
        Point::new(123.25, -77.5),
        Point::new(-960.0, 540.0),
        Point::new(3000.0, -4000.0),
    ] {
        assert!(close(t.from_preview_percent(t.to_preview_percent(p)), p));
        assert!(close(t.preview_to_canvas(t.canvas_to_preview(p)), p));
    }
}

#[test]
fn sizes_and_deltas_scale_by_ratio() {
    let t = CoordinateTransform::new(hd(), PreviewSize::new(960.0, 540.0));
    assert_eq!(t.scale_ratio(), 0.5);
    assert_eq!(t.size_to_preview(Size::new(100.0, 40.0)), Size::new(50.0, 20.0));
    assert_eq!(t.size_to_canvas(Size::new(50.0, 20.0)), Size::new(100.0, 40.0));
    assert_eq!(t.delta_to_canvas(Vec2::new(10.0, -5.0)), Vec2::new(20.0, -10.0));
}

#[test]
fn zero_width_canvas_is_identity_scale() {
    let t = CoordinateTransform::new(
        Canvas {
            width: 0,
            height: 0,
        },
        PreviewSize::new(800.0, 600.0),
    );
    assert_eq!(t.scale_ratio(), 1.0);
    assert_eq!(t.delta_to_canvas(Vec2::new(7.0, 3.0)), Vec2::new(7.0, 3.0));
    let pct = t.to_preview_percent(Point::new(100.0, 100.0));
    assert_eq!(pct, Point::new(50.0, 50.0));
    assert!(pct.x.is_finite() && pct.y.is_finite());
}

#[test]
fn element_rect_is_centered() {
    let t = CoordinateTransform::identity(hd());
    let r = t.element_rect(Point::new(10.0, 0.0), Size::new(100.0, 50.0));
    assert_eq!(r.center(), Point::new(970.0, 540.0));
    assert_eq!(r.width(), 100.0);
    assert_eq!(r.height(), 50.0);
}
