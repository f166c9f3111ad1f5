use super::*;
use crate::timeline::dsl::{ElementBuilder, TimelineBuilder, TrackBuilder};

fn canvas() -> Canvas {
    Canvas {
        width: 1920,
        height: 1080,
    }
}

#[test]
fn effective_end_subtracts_trims() {
    let el = ElementBuilder::text("t", "hi", 0.0, 5.0).trim(0.0, 1.0).build();
    assert_eq!(el.effective_end(), 4.0);
    assert!(el.is_visible_at(0.0));
    assert!(el.is_visible_at(3.999));
    assert!(!el.is_visible_at(4.0));
    assert!(!el.is_visible_at(6.0));
}

#[test]
fn hidden_elements_are_never_visible() {
    let el = ElementBuilder::text("t", "hi", 0.0, 5.0).hidden().build();
    assert!(el.covers(1.0));
    assert!(!el.is_visible_at(1.0));
}

#[test]
fn trims_longer_than_duration_fail_validation() {
    let res = TimelineBuilder::new(canvas())
        .track(
            TrackBuilder::new("a", TrackKind::Text)
                .element(ElementBuilder::text("x", "hi", 0.0, 1.0).trim(0.6, 0.6).build())
                .build()
                .unwrap(),
        )
        .build();
    assert!(res.is_err());
}

#[test]
fn opacity_out_of_range_fails_validation() {
    let res = TimelineBuilder::new(canvas())
        .track(
            TrackBuilder::new("a", TrackKind::Text)
                .element(ElementBuilder::text("x", "hi", 0.0, 1.0).opacity(1.5).build())
                .build()
                .unwrap(),
        )
        .build();
    assert!(res.is_err());
}

#[test]
fn json_uses_type_tags_and_defaults() {
    let json = r##"
{
  "settings": { "canvas": { "width": 1280, "height": 720 }, "background_color": "#112233" },
  "tracks": [
    {
      "id": "v1",
      "type": "media",
      "elements": [
        { "id": "clip", "type": "media", "media_id": "m1", "start_time": 0, "duration": 3 }
      ]
    },
    {
      "id": "t1",
      "type": "text",
      "elements": [
        {
          "id": "title", "type": "text", "content": "hi", "start_time": 1, "duration": 2,
          "position": { "x": 5.0, "y": -5.0 }, "size": { "width": 200.0, "height": 50.0 }
        }
      ]
    }
  ]
}
"##;
    let timeline = Timeline::from_json_str(json).unwrap();
    assert_eq!(timeline.settings.background_type, BackgroundType::Color);
    assert_eq!(timeline.settings.background_color, Rgba8::rgb(0x11, 0x22, 0x33));
    let (_, clip) = timeline.find_element("clip").unwrap();
    assert_eq!(clip.opacity, 1.0);
    assert_eq!(clip.kind.media_id(), Some("m1"));
    let (_, title) = timeline.find_element("title").unwrap();
    assert_eq!(title.variant(), ElementVariant::Text);
    assert_eq!(title.size, Some(Size::new(200.0, 50.0)));
    assert_eq!(timeline.duration(), 3.0);

    let back = serde_json::to_string(&timeline).unwrap();
    assert_eq!(Timeline::from_json_str(&back).unwrap(), timeline);
}

#[test]
fn unknown_element_type_is_a_serde_error() {
    let json = r#"{ "settings": { "canvas": { "width": 1, "height": 1 } },
        "tracks": [ { "id": "a", "type": "text", "elements": [
            { "id": "x", "type": "hologram", "start_time": 0, "duration": 1 } ] } ] }"#;
    assert!(matches!(
        Timeline::from_json_str(json),
        Err(CutframeError::Serde(_))
    ));
}

#[test]
fn resolved_size_prefers_authored_size() {
    let c = canvas();
    let sized = ElementBuilder::media("m", "m1", 0.0, 1.0).size(100.0, 50.0).build();
    assert_eq!(sized.resolved_size(c), Size::new(100.0, 50.0));
    let media = ElementBuilder::media("m", "m1", 0.0, 1.0).build();
    assert_eq!(media.resolved_size(c), Size::new(1920.0, 1080.0));
    let text = ElementBuilder::text("t", "abcd\nab", 0.0, 1.0).build();
    let s = text.resolved_size(c);
    assert!((s.width - 4.0 * 48.0 * 0.6).abs() < 1e-9);
    assert!((s.height - 2.0 * 48.0 * 1.2).abs() < 1e-9);
}
