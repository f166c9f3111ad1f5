use super::*;

fn layer(id: &str, variant: ElementVariant, idx: usize) -> ElementLayer {
    ElementLayer {
        element_id: id.to_string(),
        variant,
        z: element_z(variant, idx),
        rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        rotation: 0.0,
        opacity: 1.0,
        content: ElementContent::Placeholder(PlaceholderKind::Loading),
    }
}

#[test]
fn tiers_order_text_over_media_over_component() {
    assert!(variant_tier(ElementVariant::Text) > variant_tier(ElementVariant::Media));
    assert!(variant_tier(ElementVariant::Media) > variant_tier(ElementVariant::Component));
    assert_eq!(
        variant_tier(ElementVariant::Markdown),
        variant_tier(ElementVariant::Text)
    );
    // A low-index text still beats a high-index media.
    assert!(element_z(ElementVariant::Text, 0) > element_z(ElementVariant::Media, 500));
    assert!(element_z(ElementVariant::Media, 2) > element_z(ElementVariant::Media, 1));
}

#[test]
fn finish_sorts_elements_and_overlays() {
    let mut stack = LayerStack::new(
        PreviewSize::new(100.0, 100.0),
        Background::Color(Rgba8::BLACK),
    );
    stack.push_element(layer("title", ElementVariant::Text, 0));
    stack.push_element(layer("clip-b", ElementVariant::Media, 2));
    stack.push_element(layer("clip-a", ElementVariant::Media, 1));
    stack.push_element(layer("gen", ElementVariant::Component, 3));
    stack.push_overlay(Overlay::Captions { text: None });
    stack.push_overlay(Overlay::Annotation);
    stack.finish();

    assert_eq!(stack.element_order(), ["gen", "clip-a", "clip-b", "title"]);
    assert!(matches!(stack.overlays[0], Overlay::Annotation));
    assert!(stack.overlays.iter().all(|o| o.z() > stack.top_element_z().unwrap()));
    assert_eq!(stack.element("clip-b").unwrap().z, element_z(ElementVariant::Media, 2));
}
