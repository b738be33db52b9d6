//! # Assets: Image Handles and Loaders
//!
//! Scenes request images while loading and draw them once they resolve.
//!
//! ```text
//! Assets::load_image("ship.png")
//!   ├── ImageHandle   cloneable, info() == None until the load finishes
//!   └── LoadFuture    resolves Ok(()) once the handle is filled in,
//!                     or Err(LoadError::Asset { .. })
//! ```
//!
//! Fetching bytes is the host's business, so it sits behind the
//! [`AssetLoader`] trait. [`FileLoader`] reads image headers from disk with the
//! `image` crate; [`MemoryLoader`] serves a fixed table and is what headless
//! runs and tests use.
//!
//! Requests are cached by path. Asking for the same path twice returns the
//! same handle and a future that settles with the first request. A failed load
//! is retried on the next request.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::scene::LoadFuture;

/// Pixel dimensions of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

struct ImageSlot {
    path: String,
    info: OnceLock<ImageInfo>,
}

/// Opaque reference to an image. Resolves to its dimensions once loaded.
///
/// Handles are cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct ImageHandle {
    slot: Arc<ImageSlot>,
}

impl ImageHandle {
    fn new(path: &str) -> Self {
        Self {
            slot: Arc::new(ImageSlot {
                path: path.to_string(),
                info: OnceLock::new(),
            }),
        }
    }

    /// A handle that is already resolved. Useful for procedurally created images.
    pub fn ready(path: &str, info: ImageInfo) -> Self {
        let handle = Self::new(path);
        handle.resolve(info);
        handle
    }

    pub fn path(&self) -> &str {
        &self.slot.path
    }

    /// Image dimensions, or `None` while the load is still in flight (or failed).
    pub fn info(&self) -> Option<ImageInfo> {
        self.slot.info.get().copied()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.info.get().is_some()
    }

    fn resolve(&self, info: ImageInfo) {
        // A slot resolves at most once; a second resolve keeps the first value.
        let _ = self.slot.info.set(info);
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("path", &self.slot.path)
            .field("info", &self.slot.info.get())
            .finish()
    }
}

// ── Loaders ─────────────────────────────────────────────────────────────

/// Fetches and decodes images. Implemented by the host platform.
pub trait AssetLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, Result<ImageInfo, LoadError>>;
}

/// Serves images from an in-memory table.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    images: HashMap<String, ImageInfo>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image (builder pattern).
    pub fn with_image(mut self, path: &str, width: u32, height: u32) -> Self {
        self.images
            .insert(path.to_string(), ImageInfo { width, height });
        self
    }
}

impl AssetLoader for MemoryLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, Result<ImageInfo, LoadError>> {
        let result = self
            .images
            .get(path)
            .copied()
            .ok_or_else(|| LoadError::asset(path, "not found"));
        futures::future::ready(result).boxed_local()
    }
}

/// Reads image dimensions from files under a root directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FileLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, Result<ImageInfo, LoadError>> {
        let full = self.root.join(path);
        let path = path.to_string();
        async move {
            let (width, height) =
                image::image_dimensions(&full).map_err(|e| LoadError::asset(&path, e))?;
            log::debug!("loaded image {path} ({width}x{height})");
            Ok(ImageInfo { width, height })
        }
        .boxed_local()
    }
}

// ── Assets ──────────────────────────────────────────────────────────────

type SharedLoad = Shared<LoadFuture>;

/// Image registry shared by all scenes of a game.
pub struct Assets {
    loader: Box<dyn AssetLoader>,
    images: HashMap<String, (ImageHandle, SharedLoad)>,
}

impl Assets {
    pub fn new(loader: impl AssetLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            images: HashMap::new(),
        }
    }

    /// Request an image.
    ///
    /// Returns the handle right away and a future that resolves when the
    /// handle has been filled in. Await it from a scene's load step to make
    /// the scene wait for the image.
    pub fn load_image(&mut self, path: &str) -> (ImageHandle, LoadFuture) {
        if let Some((handle, load)) = self.images.get(path) {
            let failed = matches!(load.peek(), Some(Err(_)));
            if !failed {
                return (handle.clone(), load.clone().boxed_local());
            }
            log::debug!("retrying failed image load {path}");
        }

        let handle = ImageHandle::new(path);
        let fetch = self.loader.load_image(path);
        let target = handle.clone();
        let load: LoadFuture = async move {
            let info = fetch.await?;
            target.resolve(info);
            Ok(())
        }
        .boxed_local();
        let load = load.shared();

        self.images
            .insert(path.to_string(), (handle.clone(), load.clone()));
        (handle, load.boxed_local())
    }

    /// Look up a previously requested image.
    pub fn image(&self, path: &str) -> Option<ImageHandle> {
        self.images.get(path).map(|(handle, _)| handle.clone())
    }

    /// Number of distinct image paths requested so far.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new(MemoryLoader::new())
    }
}

impl fmt::Debug for Assets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assets")
            .field("images", &self.images.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn handle_resolves_after_load() {
        let mut assets = Assets::new(MemoryLoader::new().with_image("ship.png", 32, 16));
        let (handle, load) = assets.load_image("ship.png");
        assert_eq!(handle.info(), None);

        block_on(load).unwrap();
        assert_eq!(
            handle.info(),
            Some(ImageInfo {
                width: 32,
                height: 16
            })
        );
    }

    #[test]
    fn same_path_shares_handle() {
        let mut assets = Assets::new(MemoryLoader::new().with_image("a.png", 1, 1));
        let (first, _) = assets.load_image("a.png");
        let (second, load) = assets.load_image("a.png");
        assert_eq!(first, second);
        block_on(load).unwrap();
        assert!(first.is_loaded());
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn missing_image_is_asset_error() {
        let mut assets = Assets::default();
        let (handle, load) = assets.load_image("nope.png");
        let err = block_on(load).unwrap_err();
        assert!(matches!(err, LoadError::Asset { ref path, .. } if path == "nope.png"));
        assert!(!handle.is_loaded());

        // A later request tries again with a fresh handle.
        let (retry, _) = assets.load_image("nope.png");
        assert_ne!(retry, handle);
    }

    #[test]
    fn file_loader_reports_missing_file() {
        let loader = FileLoader::new(std::env::temp_dir());
        let err = block_on(loader.load_image("blaze-definitely-missing.png")).unwrap_err();
        assert!(matches!(err, LoadError::Asset { .. }));
    }
}
