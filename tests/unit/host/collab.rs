use super::*;
use crate::effects::merge::EffectEntry;
use crate::foundation::core::Canvas;
use crate::timeline::dsl::{ElementBuilder, TimelineBuilder, TrackBuilder};
use crate::timeline::model::TrackKind;

fn store() -> InMemoryStore {
    let timeline = TimelineBuilder::new(Canvas {
        width: 1920,
        height: 1080,
    })
    .track(
        TrackBuilder::new("t1", TrackKind::Text)
            .element(ElementBuilder::text("title", "hello", 0.0, 3.0).build())
            .build()
            .unwrap(),
    )
    .build()
    .unwrap();
    InMemoryStore::new(timeline)
}

#[test]
fn store_applies_and_records_updates() {
    let mut s = store();
    s.update_position("title", Point::new(12.0, -4.0));
    s.update_rotation("title", 45.0);
    s.update_text_content("title", "bye");
    let (_, el) = s.timeline().find_element("title").unwrap();
    assert_eq!(el.position, Some(Point::new(12.0, -4.0)));
    assert_eq!(el.rotation, 45.0);
    match &el.kind {
        ElementKind::Text(t) => assert_eq!(t.content, "bye"),
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(s.updates().len(), 3);
}

#[test]
fn updates_to_unknown_elements_are_recorded_but_harmless() {
    let mut s = store();
    s.update_size("ghost", Size::new(10.0, 10.0));
    assert_eq!(s.updates().len(), 1);
    assert!(s.timeline().find_element("ghost").is_none());
}

#[test]
fn remove_element_reports_presence() {
    let mut s = store();
    assert!(s.remove_element("title"));
    assert!(!s.remove_element("title"));
}

#[test]
fn registry_defaults_to_missing() {
    let mut reg = InMemoryMediaRegistry::new();
    reg.insert("loading", MediaLookup::Loading);
    assert!(matches!(reg.resolve("loading"), MediaLookup::Loading));
    assert!(matches!(reg.resolve("nope"), MediaLookup::Missing));
}

#[test]
fn audio_handles_have_no_pixels() {
    let handle = MediaHandle {
        media_id: "a".to_string(),
        media_type: MediaType::Audio,
        poster: Some(Arc::new(image::RgbaImage::new(1, 1))),
        frames: None,
    };
    assert!(handle.pixels_at(0.0).is_none());
    let img = MediaHandle::image("i", image::RgbaImage::new(2, 2));
    assert_eq!(img.pixels_at(3.0).unwrap().width(), 2);
}

#[test]
fn effects_registry_returns_empty_for_unknown() {
    let mut fx = InMemoryEffects::new();
    fx.set("a", vec![EffectEntry::enabled([("blur", 2.0)])]);
    assert_eq!(fx.effects("a").len(), 1);
    assert!(fx.effects("b").is_empty());
}
