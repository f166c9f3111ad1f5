use super::*;

#[test]
fn same_input_same_fingerprint() {
    let mut a = StableHasher::new();
    a.write_str("track-1");
    a.write_f64(2.5);
    let mut b = StableHasher::new();
    b.write_str("track-1");
    b.write_f64(2.5);
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn string_boundaries_are_distinguished() {
    let mut a = StableHasher::new();
    a.write_str("ab");
    a.write_str("c");
    let mut b = StableHasher::new();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn serialize_hash_tracks_content() {
    let mut a = StableHasher::new();
    a.write_serialize(&serde_json::json!({ "x": 1 }));
    let mut b = StableHasher::new();
    b.write_serialize(&serde_json::json!({ "x": 2 }));
    assert_ne!(a.finish(), b.finish());
}
