use std::sync::Arc;

use super::*;
use crate::effects::merge::EffectEntry;
use crate::foundation::core::Canvas;
use crate::host::collab::{
    InMemoryEffects, InMemoryMediaRegistry, InMemoryStore, ManualClock, MediaHandle,
};
use crate::interact::pointer::HitPart;
use crate::timeline::dsl::{ElementBuilder, TimelineBuilder, TrackBuilder};
use crate::timeline::model::TrackKind;

const CANVAS: Canvas = Canvas {
    width: 64,
    height: 36,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "cutframe_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn store() -> InMemoryStore {
    let timeline = TimelineBuilder::new(CANVAS)
        .track(
            TrackBuilder::new("v", TrackKind::Media)
                .element(ElementBuilder::media("clip", "img", 0.0, 10.0).build())
                .build()
                .unwrap(),
        )
        .track(
            TrackBuilder::new("s", TrackKind::Sticker)
                .element(
                    ElementBuilder::sticker("logo", "img", 0.0, 10.0)
                        .size(16.0, 16.0)
                        .build(),
                )
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    InMemoryStore::new(timeline)
}

fn media() -> InMemoryMediaRegistry {
    let mut m = InMemoryMediaRegistry::new();
    m.insert_ready(MediaHandle::image(
        "img",
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 128, 0, 255])),
    ));
    m
}

fn session() -> PreviewSession {
    PreviewSession::new(PreviewOpts::default(), PreviewSize::new(64.0, 36.0))
}

#[test]
fn unchanged_inputs_reuse_the_live_frame() {
    let s = store();
    let reg = media();
    let fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(1.0);
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    let mut p = session();

    assert!(p.is_dirty(&s, &host));
    let a = p.render_frame(&s, &host).unwrap();
    assert!(!p.is_dirty(&s, &host));
    let b = p.render_frame(&s, &host).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    // Live draws never populate the frame cache.
    assert!(p.cache().is_empty());

    let later = ManualClock::paused_at(2.0);
    let host = Host {
        clock: &later,
        ..host
    };
    assert!(p.is_dirty(&s, &host));
    let c = p.render_frame(&s, &host).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn effect_changes_invalidate_cached_frames() {
    let s = store();
    let reg = media();
    let mut fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(1.0);
    let mut p = session();

    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    let before = p.render_cached(&s, &host, 1.0).unwrap();
    assert_eq!(before.get_pixel(2, 2).0, [0, 128, 0, 255]);
    p.render_frame(&s, &host).unwrap();
    let invalidations = p.cache_stats().invalidations;
    let namespace = p.cache().namespace().to_string();

    fx.set("clip", vec![EffectEntry::enabled([("invert", 100.0)])]);
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    assert!(p.is_dirty(&s, &host));
    let live = p.render_frame(&s, &host).unwrap();
    assert_eq!(live.get_pixel(2, 2).0, [255, 127, 255, 255]);
    assert_eq!(p.cache_stats().invalidations, invalidations + 1);
    assert_ne!(p.cache().namespace(), namespace);

    let after = p.render_cached(&s, &host, 1.0).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.get_pixel(2, 2).0, [255, 127, 255, 255]);
}

#[test]
fn media_finishing_loading_replaces_placeholder_frames() {
    let s = store();
    let mut reg = InMemoryMediaRegistry::new();
    reg.insert("img", MediaLookup::Loading);
    let fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(1.0);
    let mut p = session();

    let (loading_live, loading_cached) = {
        let host = Host {
            media: &reg,
            effects: &fx,
            clock: &clock,
        };
        (
            p.render_frame(&s, &host).unwrap(),
            p.render_cached(&s, &host, 1.0).unwrap(),
        )
    };
    assert_ne!(loading_live.get_pixel(2, 2).0, [0, 128, 0, 255]);

    let reg = media();
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    assert!(p.is_dirty(&s, &host));
    let ready_live = p.render_frame(&s, &host).unwrap();
    assert!(!Arc::ptr_eq(&loading_live, &ready_live));
    assert_eq!(ready_live.get_pixel(2, 2).0, [0, 128, 0, 255]);

    let ready_cached = p.render_cached(&s, &host, 1.0).unwrap();
    assert!(!Arc::ptr_eq(&loading_cached, &ready_cached));
    assert_eq!(ready_cached.get_pixel(2, 2).0, [0, 128, 0, 255]);
}

#[test]
fn idle_prefetch_never_evicts_the_current_frame() {
    let s = store();
    let reg = media();
    let fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(1.0);
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    let opts = PreviewOpts {
        cache_capacity: 2,
        ..PreviewOpts::default()
    };
    let mut p = PreviewSession::new(opts, PreviewSize::new(64.0, 36.0));

    p.render_cached(&s, &host, 1.0).unwrap();
    p.render_frame(&s, &host).unwrap();
    let report = p.on_idle(&s, &host);
    assert_eq!(report.rendered, 2);
    assert_eq!(p.cache().len(), 2);
    assert!(p.cache().contains(crate::foundation::core::TimeTick(30)));
    assert!(p.cache().contains(crate::foundation::core::TimeTick(29)));
    assert_eq!(p.cache_stats().hits, 0);
    p.render_cached(&s, &host, 1.0).unwrap();
    assert_eq!(p.cache_stats().hits, 1);
}

#[test]
fn drag_commit_invalidates_cached_frames() {
    let mut s = store();
    let reg = media();
    let fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(1.0);
    let mut p = session();

    {
        let host = Host {
            media: &reg,
            effects: &fx,
            clock: &clock,
        };
        p.render_cached(&s, &host, 1.0).unwrap();
        assert_eq!(p.cache().len(), 1);
    }

    assert_eq!(
        p.handle_pointer(&PointerEvent::moved(10.0, 10.0), &mut s),
        ControllerOutcome::Ignored
    );
    assert_eq!(
        p.handle_pointer(&PointerEvent::down(32.0, 18.0, "logo", HitPart::Body), &mut s),
        ControllerOutcome::Started
    );
    assert_eq!(p.selection(), Some("logo"));
    assert!(p.controller().is_listening());
    p.handle_pointer(&PointerEvent::moved(40.0, 18.0), &mut s);

    {
        let host = Host {
            media: &reg,
            effects: &fx,
            clock: &clock,
        };
        let stack = p.compose(&s, &host);
        assert_eq!(stack.element("logo").unwrap().rect.center().x, 40.0);
    }

    let outcome = p.handle_pointer(&PointerEvent::up(40.0, 18.0), &mut s);
    assert!(matches!(outcome, ControllerOutcome::Committed(_)));

    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };
    p.render_frame(&s, &host).unwrap();
    assert!(p.cache().is_empty());
    assert!(p.cache().namespace().starts_with("default-"));
}

#[test]
fn idle_prefetch_warms_neighbours_only_when_paused() {
    let s = store();
    let reg = media();
    let fx = InMemoryEffects::new();
    let mut p = session();

    let playing = ManualClock {
        time: 1.0,
        playing: true,
    };
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &playing,
    };
    p.render_frame(&s, &host).unwrap();
    assert_eq!(p.prefetch_pending(), 0);
    assert_eq!(p.on_idle(&s, &host), PrefetchReport::default());

    let paused = ManualClock::paused_at(1.0);
    let host = Host {
        clock: &paused,
        ..host
    };
    p.render_frame(&s, &host).unwrap();
    assert_eq!(p.prefetch_pending(), 8);
    let report = p.on_idle(&s, &host);
    assert_eq!(report.rendered, 2);
    assert_eq!(p.cache().len(), 2);
    // 1.0s at 30 fps is tick 30; the nearest forward neighbour comes first.
    assert!(p.cache().contains(crate::foundation::core::TimeTick(31)));
    assert!(p.cache().contains(crate::foundation::core::TimeTick(29)));
}

#[test]
fn options_load_from_partial_json() {
    let dir = temp_dir("opts");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("opts.json");
    std::fs::write(
        &path,
        r#"{"cache_capacity": 8, "fps": {"num": 24, "den": 1}, "project_id": "demo"}"#,
    )
    .unwrap();
    let opts = PreviewOpts::from_json_path(&path).unwrap();
    assert_eq!(opts.cache_capacity, 8);
    assert_eq!(opts.fps, Fps::new(24, 1).unwrap());
    assert_eq!(opts.project_id, "demo");
    assert_eq!(opts.prefetch_radius, 4);
    assert_eq!(opts.min_element_size, 50.0);

    std::fs::write(&path, r#"{"fps": {"num": 24, "den": 0}}"#).unwrap();
    assert!(PreviewOpts::from_json_path(&path).is_err());
    assert!(PreviewOpts::from_json_path(dir.join("missing.json")).is_err());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn persisted_frames_survive_a_new_session() {
    let dir = temp_dir("session_persist");
    let opts = PreviewOpts {
        persist_dir: Some(dir.clone()),
        project_id: "demo".to_string(),
        ..PreviewOpts::default()
    };
    let s = store();
    let reg = media();
    let fx = InMemoryEffects::new();
    let clock = ManualClock::paused_at(0.0);
    let host = Host {
        media: &reg,
        effects: &fx,
        clock: &clock,
    };

    let mut first = PreviewSession::new(opts.clone(), PreviewSize::new(64.0, 36.0));
    let a = first.render_cached(&s, &host, 2.0).unwrap();

    let mut second = PreviewSession::new(opts, PreviewSize::new(64.0, 36.0));
    let b = second.render_cached(&s, &host, 2.0).unwrap();
    assert_eq!(*a, *b);
    assert_eq!(second.cache_stats().persisted_hits, 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fingerprints_track_content_effects_and_media() {
    let mut s = store();
    let settings = s.timeline().settings.clone();
    let before = content_fingerprint(&s.timeline().tracks, &settings);
    assert_eq!(before, content_fingerprint(&s.timeline().tracks, &settings));
    s.update_rotation("logo", 10.0);
    assert_ne!(before, content_fingerprint(&s.timeline().tracks, &settings));

    let mut fx = InMemoryEffects::new();
    let empty = effects_fingerprint(&s.timeline().tracks, &fx);
    fx.set("not-on-timeline", vec![EffectEntry::enabled([("blur", 3.0)])]);
    assert_eq!(empty, effects_fingerprint(&s.timeline().tracks, &fx));
    fx.set("logo", vec![EffectEntry::enabled([("blur", 3.0)])]);
    assert_ne!(empty, effects_fingerprint(&s.timeline().tracks, &fx));
}

#[test]
fn media_fingerprint_follows_registry_state() {
    let s = store();
    let mut reg = InMemoryMediaRegistry::new();
    reg.insert("img", MediaLookup::Loading);
    let loading = media_fingerprint(&s.timeline().tracks, &reg);
    assert_eq!(loading, media_fingerprint(&s.timeline().tracks, &reg));
    assert_ne!(loading, media_fingerprint(&s.timeline().tracks, &media()));
    reg.insert("img", MediaLookup::Errored("decode".to_string()));
    assert_ne!(loading, media_fingerprint(&s.timeline().tracks, &reg));
}
