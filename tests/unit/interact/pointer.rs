use super::*;

fn geometry(rotation: f64) -> HandleGeometry {
    HandleGeometry::new(Rect::new(100.0, 100.0, 300.0, 200.0), rotation)
}

#[test]
fn compass_flags_are_consistent() {
    for h in ResizeHandle::ALL {
        assert!(!(h.north() && h.south()));
        assert!(!(h.east() && h.west()));
        assert!(h.north() || h.south() || h.east() || h.west());
    }
    assert!(ResizeHandle::Nw.north() && ResizeHandle::Nw.west());
    assert!(ResizeHandle::Se.south() && ResizeHandle::Se.east());
}

#[test]
fn hit_test_finds_parts() {
    let g = geometry(0.0);
    assert_eq!(g.hit_test(Point::new(200.0, 150.0)), Some(HitPart::Body));
    assert_eq!(
        g.hit_test(Point::new(300.0, 200.0)),
        Some(HitPart::Resize(ResizeHandle::Se))
    );
    assert_eq!(
        g.hit_test(Point::new(100.0, 150.0)),
        Some(HitPart::Resize(ResizeHandle::W))
    );
    assert_eq!(
        g.hit_test(Point::new(200.0, 100.0 - ROTATE_HANDLE_OFFSET)),
        Some(HitPart::Rotate)
    );
    assert_eq!(g.hit_test(Point::new(20.0, 20.0)), None);
}

#[test]
fn hit_test_follows_rotation() {
    // Rotated 90 degrees clockwise, the east handle sits below the center.
    let g = geometry(90.0);
    assert_eq!(
        g.hit_test(Point::new(200.0, 250.0)),
        Some(HitPart::Resize(ResizeHandle::E))
    );
}

#[test]
fn events_serialize_with_snake_case_kinds() {
    let ev = PointerEvent::down(1.0, 2.0, "el", HitPart::Resize(ResizeHandle::Nw));
    let json = serde_json::to_value(&ev).unwrap();
    assert_eq!(json["kind"], "down");
    assert_eq!(json["target"]["part"]["resize"], "nw");
    let back: PointerEvent = serde_json::from_value(json).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn free_hit_test_matches_geometry() {
    let r = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(
        hit_test_handles(Point::new(50.0, 50.0), r, 0.0),
        Some(HitPart::Body)
    );
    assert_eq!(
        hit_test_handles(Point::new(0.0, 0.0), r, 0.0),
        Some(HitPart::Resize(ResizeHandle::Nw))
    );
}
