use super::*;

#[test]
fn quantize_rounds_to_nearest_bucket() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.quantize(0.0), TimeTick(0));
    assert_eq!(fps.quantize(1.0), TimeTick(30));
    // 1.004s and 1.012s both land in bucket 30.
    assert_eq!(fps.quantize(1.004), fps.quantize(1.012));
    assert_eq!(fps.quantize(-3.0), TimeTick(0));
    assert_eq!(fps.quantize(f64::NAN), TimeTick(0));
}

#[test]
fn tick_to_secs_inverts_quantize_on_grid() {
    let fps = Fps::new(30000, 1001).unwrap();
    let tick = TimeTick(123);
    assert_eq!(fps.quantize(tick.to_secs(fps)), tick);
}

#[test]
fn tick_offset_saturates() {
    assert_eq!(TimeTick(2).offset(-5), TimeTick(0));
    assert_eq!(TimeTick(2).offset(3), TimeTick(5));
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn hex_colors_parse_and_format() {
    assert_eq!(Rgba8::from_hex("#ff3366").unwrap(), Rgba8::rgb(255, 0x33, 0x66));
    assert_eq!(Rgba8::from_hex("fff").unwrap(), Rgba8::WHITE);
    let c = Rgba8::from_hex("#00000080").unwrap();
    assert_eq!(c.a, 0x80);
    assert_eq!(c.to_hex(), "#00000080");
    assert!(Rgba8::from_hex("#12").is_err());
    assert!(Rgba8::from_hex("#zzzzzz").is_err());
}

#[test]
fn colors_roundtrip_through_json_strings() {
    let c: Rgba8 = serde_json::from_str("\"#102030\"").unwrap();
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#102030\"");
}

#[test]
fn preview_fit_width_keeps_aspect() {
    let canvas = Canvas {
        width: 1920,
        height: 1080,
    };
    let p = PreviewSize::fit_width(canvas, 960.0);
    assert_eq!(p.height, 540.0);
}
