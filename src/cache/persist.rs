use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::TimeTick;

/// Advisory cross-restart frame storage.
///
/// Errors are reported but never fatal: the cache treats them as a miss and renders.
pub trait FramePersistence {
    /// Load a persisted frame, `Ok(None)` when absent.
    fn load(&self, namespace: &str, tick: TimeTick) -> anyhow::Result<Option<image::RgbaImage>>;

    /// Persist a frame, replacing any previous one under the same key.
    fn store(&self, namespace: &str, tick: TimeTick, frame: &image::RgbaImage)
    -> anyhow::Result<()>;
}

/// PNG files under a directory, named `{namespace}_{tick}.png`.
#[derive(Clone, Debug)]
pub struct DiskFrameStore {
    root: PathBuf,
}

impl DiskFrameStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a key.
    pub fn path_for(&self, namespace: &str, tick: TimeTick) -> PathBuf {
        self.root
            .join(format!("{}_{}.png", sanitize_namespace(namespace), tick.0))
    }
}

fn sanitize_namespace(ns: &str) -> String {
    let cleaned: String = ns
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

impl FramePersistence for DiskFrameStore {
    fn load(&self, namespace: &str, tick: TimeTick) -> anyhow::Result<Option<image::RgbaImage>> {
        let path = self.path_for(namespace, tick);
        if !path.is_file() {
            return Ok(None);
        }
        let img = image::open(&path)
            .with_context(|| format!("decode persisted frame '{}'", path.display()))?;
        Ok(Some(img.into_rgba8()))
    }

    fn store(
        &self,
        namespace: &str,
        tick: TimeTick,
        frame: &image::RgbaImage,
    ) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create frame store dir '{}'", self.root.display()))?;
        let path = self.path_for(namespace, tick);
        frame
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("write persisted frame '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/persist.rs"]
mod tests;
