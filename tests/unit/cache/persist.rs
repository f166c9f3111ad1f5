use super::*;

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

#[test]
fn store_then_load_roundtrips_pixels() {
    let dir = temp_dir("persist_roundtrip");
    let store = DiskFrameStore::new(&dir);
    let frame = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    store.store("proj", TimeTick(7), &frame).unwrap();
    let loaded = store.load("proj", TimeTick(7)).unwrap().unwrap();
    assert_eq!(loaded, frame);
    assert!(store.load("proj", TimeTick(8)).unwrap().is_none());
    assert!(store.load("other", TimeTick(7)).unwrap().is_none());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn namespaces_are_sanitized_into_file_names() {
    let store = DiskFrameStore::new("/tmp/x");
    let p = store.path_for("my proj/../v2", TimeTick(3));
    assert_eq!(p.file_name().unwrap().to_str().unwrap(), "my-proj-..-v2_3.png");
    assert_eq!(p.parent().unwrap(), Path::new("/tmp/x"));
    let p = store.path_for("", TimeTick(0));
    assert_eq!(p.file_name().unwrap().to_str().unwrap(), "default_0.png");
}

#[test]
fn corrupt_files_surface_as_errors() {
    let dir = temp_dir("persist_corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let store = DiskFrameStore::new(&dir);
    std::fs::write(store.path_for("p", TimeTick(1)), b"not a png").unwrap();
    assert!(store.load("p", TimeTick(1)).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
