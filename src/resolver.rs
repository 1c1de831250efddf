// src/resolver.rs
//! Texture resolution: canonical keys, loading, caching and fallback.
//!
//! The cache is an explicit service shared by `Arc`. Each key owns a
//! `OnceCell`, so concurrent requests for a key that is still loading wait on
//! the same load instead of issuing another one.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use image::RgbaImage;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::texture::{decode_rgba, Texture, TextureGenerator, TextureHandle, TextureSettings, TextureSource};

// ─────────────────────────────────────────────────────────────────────────────
// Keys
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves `url` against `base` into an absolute key.
///
/// - `scheme://...` is already absolute and only has its path normalized.
/// - `/path` replaces the path of `base`, keeping its origin.
/// - anything else is relative to the directory of `base`.
///
/// `.` and `..` segments are collapsed; `..` never climbs above the root.
pub fn resolve_key(base: &str, url: &str) -> String {
    let url = url.trim();
    if let Some((origin, path)) = split_origin(url) {
        return format!("{origin}{}", normalize_path(path));
    }

    let (origin, base_path) = split_origin(base).unwrap_or(("", base));
    let path = if url.starts_with('/') {
        url.to_string()
    } else {
        // Directory of the base: everything up to the last '/'.
        let dir = match base_path.rfind('/') {
            Some(idx) => &base_path[..=idx],
            None => "/",
        };
        format!("{dir}{url}")
    };
    format!("{origin}{}", normalize_path(&path))
}

/// Splits `scheme://authority` from the path. `None` if there is no scheme.
fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")?;
    let scheme = &url[..scheme_end];
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    let rest_start = scheme_end + 3;
    let path_start = url[rest_start..].find('/').map_or(url.len(), |i| rest_start + i);
    Some((&url[..path_start], &url[path_start..]))
}

fn normalize_path(path: &str) -> String {
    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    out.push_str(&segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Loaders
// ─────────────────────────────────────────────────────────────────────────────

/// Fetches and decodes the pixels behind a resolved key.
pub trait TextureLoader {
    fn load(&self, key: &str) -> impl Future<Output = anyhow::Result<RgbaImage>>;
}

/// Reads local files. Accepts `file://` keys and plain paths.
#[derive(Debug, Clone, Default)]
pub struct FsTextureLoader;

impl FsTextureLoader {
    pub fn path_for(key: &str) -> anyhow::Result<PathBuf> {
        match split_origin(key) {
            Some((origin, path)) if origin.eq_ignore_ascii_case("file://") => Ok(PathBuf::from(path)),
            Some((origin, _)) => Err(anyhow!("unsupported texture location {origin}")),
            None => Ok(PathBuf::from(key)),
        }
    }
}

impl TextureLoader for FsTextureLoader {
    async fn load(&self, key: &str) -> anyhow::Result<RgbaImage> {
        let path = Self::path_for(key)?;
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        decode_rgba(&bytes).with_context(|| format!("decoding {}", path.display()))
    }
}

/// Serves preloaded images, keyed by resolved key.
#[derive(Debug, Default)]
pub struct MemoryTextureLoader {
    images: HashMap<String, RgbaImage>,
}

impl MemoryTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, key: impl Into<String>, image: RgbaImage) -> Self {
        self.images.insert(key.into(), image);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, image: RgbaImage) {
        self.images.insert(key.into(), image);
    }
}

impl TextureLoader for MemoryTextureLoader {
    async fn load(&self, key: &str) -> anyhow::Result<RgbaImage> {
        self.images
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no texture registered for {key}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache service
// ─────────────────────────────────────────────────────────────────────────────

/// Key → texture, for the lifetime of the process. Entries are never evicted.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<TextureHandle>>>>,
    loads_issued: AtomicUsize,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle for `key` if its load has completed.
    pub fn get(&self, key: &str) -> Option<TextureHandle> {
        self.entries.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `get_or_load` actually ran a load.
    pub fn loads_issued(&self) -> usize {
        self.loads_issued.load(Ordering::Relaxed)
    }

    /// Returns the cached handle for `key`, or runs `load` once and caches its
    /// result. Concurrent callers for the same key share one `load`.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> TextureHandle
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TextureHandle>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key.to_string()).or_default())
        };
        let handle = cell
            .get_or_init(|| {
                self.loads_issued.fetch_add(1, Ordering::Relaxed);
                load()
            })
            .await
            .clone();
        handle
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

pub struct TextureResolver<L> {
    base: String,
    cache: Arc<TextureCache>,
    loader: L,
}

impl<L: TextureLoader> TextureResolver<L> {
    pub fn new(base: impl Into<String>, loader: L) -> Self {
        Self::with_cache(base, loader, Arc::new(TextureCache::new()))
    }

    pub fn with_cache(base: impl Into<String>, loader: L, cache: Arc<TextureCache>) -> Self {
        Self {
            base: base.into(),
            cache,
            loader,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn cache(&self) -> &Arc<TextureCache> {
        &self.cache
    }

    pub fn key_for(&self, url: &str) -> String {
        resolve_key(&self.base, url)
    }

    /// Resolves `url` to a texture. Never fails: a resource that cannot be
    /// loaded is replaced by the checkerboard fallback, which is cached under
    /// the same key.
    pub async fn resolve(&self, url: &str, is_color_map: bool) -> TextureHandle {
        let key = self.key_for(url);
        let handle = self
            .cache
            .get_or_load(&key, || async {
                match self.loader.load(&key).await {
                    Ok(image) => {
                        log::info!("[OK] texture {key}");
                        let settings = TextureSettings::default().with_srgb(is_color_map);
                        Arc::new(Texture::new(key.as_str(), image, TextureSource::Loaded, settings))
                    }
                    Err(err) => {
                        log::warn!("[FAIL] texture {key}: {err:#}");
                        Arc::new(TextureGenerator::fallback(key.as_str()))
                    }
                }
            })
            .await;
        if is_color_map {
            handle.mark_srgb();
        }
        handle
    }

    /// `resolve` for optional map slots; empty or missing URLs yield `None`.
    pub async fn resolve_optional(&self, url: Option<&str>, is_color_map: bool) -> Option<TextureHandle> {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => Some(self.resolve(url, is_color_map).await),
            _ => None,
        }
    }
}
