//! Path-keyed cache of decoded textures.
//!
//! A hit returns the same `Arc<Texture>` every time; nothing is evicted and
//! a cached entry is returned even after the file on disk changes. Mod
//! authors iterating on images turn caching off in their `Mod.json`
//! (`cacheEnabled: false`) to get a fresh decode on every apply.

use crate::metrics::ModMetrics;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a texture will be used; decides the decoded pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureKind {
    /// General purpose texture with alpha.
    #[default]
    Standard,
    /// Skybox panorama; decoded without alpha.
    Skybox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Decoded image data.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
    /// File the pixels came from; `None` for placeholders.
    pub source: Option<Utf8PathBuf>,
}

impl Texture {
    /// 2x2 white texture handed out when a file is missing or undecodable.
    pub fn placeholder(kind: TextureKind) -> Self {
        let format = format_for(kind);
        Self {
            width: 2,
            height: 2,
            format,
            pixels: vec![u8::MAX; 4 * format.bytes_per_pixel()],
            source: None,
        }
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8], kind: TextureKind) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(bytes)?;
        let texture = match format_for(kind) {
            PixelFormat::Rgba8 => {
                let rgba = image.to_rgba8();
                Self {
                    width: rgba.width(),
                    height: rgba.height(),
                    format: PixelFormat::Rgba8,
                    pixels: rgba.into_raw(),
                    source: None,
                }
            }
            PixelFormat::Rgb8 => {
                let rgb = image.to_rgb8();
                Self {
                    width: rgb.width(),
                    height: rgb.height(),
                    format: PixelFormat::Rgb8,
                    pixels: rgb.into_raw(),
                    source: None,
                }
            }
        };
        Ok(texture)
    }

    pub fn is_placeholder(&self) -> bool {
        self.source.is_none()
    }
}

fn format_for(kind: TextureKind) -> PixelFormat {
    match kind {
        TextureKind::Standard => PixelFormat::Rgba8,
        TextureKind::Skybox => PixelFormat::Rgb8,
    }
}

/// Shared texture cache. Construct once and hand out via `Arc`.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: Mutex<HashMap<Utf8PathBuf, Arc<Texture>>>,
    metrics: Arc<ModMetrics>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<ModMetrics>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Utf8PathBuf, Arc<Texture>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `{base_path}/{relative_name}`.
    ///
    /// With `use_cache` the lock is held across check, decode and insert so
    /// two callers never decode the same key twice. Without it the cache is
    /// neither read nor written. Missing or undecodable files produce a
    /// placeholder and a logged error, never a failure.
    pub fn load(
        &self,
        base_path: &Utf8Path,
        relative_name: &str,
        use_cache: bool,
        kind: TextureKind,
    ) -> Arc<Texture> {
        let path = base_path.join(relative_name);

        if !use_cache {
            self.metrics.record_cache_miss();
            let texture = Arc::new(decode_file(&path, kind));
            tracing::debug!("Loaded {} without caching", relative_name);
            return texture;
        }

        let mut entries = self.lock();
        if let Some(texture) = entries.get(&path) {
            self.metrics.record_cache_hit();
            tracing::debug!("Cache hit for {}", relative_name);
            return Arc::clone(texture);
        }

        self.metrics.record_cache_miss();
        let texture = Arc::new(decode_file(&path, kind));
        if !texture.is_placeholder() {
            entries.insert(path, Arc::clone(&texture));
            tracing::debug!("Put {} into cache", relative_name);
        }
        texture
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn decode_file(path: &Utf8Path, kind: TextureKind) -> Texture {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("There is no readable file at '{}': {}", path, e);
            return Texture::placeholder(kind);
        }
    };

    match Texture::decode(&bytes, kind) {
        Ok(mut texture) => {
            texture.source = Some(path.to_path_buf());
            texture
        }
        Err(e) => {
            tracing::error!("Could not decode image '{}': {}", path, e);
            Texture::placeholder(kind)
        }
    }
}
