use super::*;

#[test]
fn later_entries_override_not_add() {
    let spec = merge_effects(&[
        EffectEntry::enabled([("a", 1.0)]),
        EffectEntry::enabled([("a", 2.0)]),
    ]);
    assert_eq!(spec.param("a"), Some(2.0));
    assert_eq!(
        spec,
        FilterSpec::Params(BTreeMap::from([("a".to_string(), 2.0)]))
    );
}

#[test]
fn empty_and_all_disabled_are_no_effect() {
    assert_eq!(merge_effects(&[]), FilterSpec::NoEffect);
    let spec = merge_effects(&[
        EffectEntry::disabled([("brightness", 20.0)]),
        EffectEntry::disabled([("contrast", 10.0)]),
    ]);
    assert!(spec.is_none());
    assert_eq!(spec.to_css(), "none");
}

#[test]
fn disabled_entries_do_not_override() {
    let spec = merge_effects(&[
        EffectEntry::enabled([("brightness", 20.0)]),
        EffectEntry::disabled([("brightness", -50.0)]),
    ]);
    assert_eq!(spec.param("brightness"), Some(20.0));
}

#[test]
fn disjoint_keys_are_unioned() {
    let spec = merge_effects(&[
        EffectEntry::enabled([("brightness", 20.0)]),
        EffectEntry::enabled([("blur", 4.0)]),
    ]);
    assert_eq!(spec.param("brightness"), Some(20.0));
    assert_eq!(spec.param("blur"), Some(4.0));
}

#[test]
fn ops_follow_canonical_order_and_drop_identity() {
    let spec = merge_effects(&[EffectEntry::enabled([
        ("blur", 3.0),
        ("brightness", 50.0),
        ("contrast", 0.0),
        ("sparkle", 9.0),
    ])]);
    assert_eq!(
        spec.filter_ops(),
        vec![FilterOp::Brightness(1.5), FilterOp::Blur(3.0)]
    );
    assert_eq!(spec.to_css(), "brightness(1.5) blur(3px)");
}

#[test]
fn percentages_are_clamped() {
    let spec = merge_effects(&[EffectEntry::enabled([
        ("grayscale", 250.0),
        ("hue", -90.0),
    ])]);
    assert_eq!(
        spec.filter_ops(),
        vec![FilterOp::HueRotate(270.0), FilterOp::Grayscale(1.0)]
    );
}

#[test]
fn entries_deserialize_with_enabled_default() {
    let set: EffectSet =
        serde_json::from_str(r#"[{ "parameters": { "sepia": 40 } }, { "enabled": false }]"#)
            .unwrap();
    assert!(set[0].enabled);
    assert!(!set[1].enabled);
    assert_eq!(merge_effects(&set).filter_ops(), vec![FilterOp::Sepia(0.4)]);
}
