//! Process-wide icon cache shared by the popup and background preloads.
//!
//! Bitmaps are immutable once cached and handed out as `Arc`s, so readers
//! never see a partially written entry.

use crate::launch::expand_env_vars;
use crate::{Error, Result};
use clickdeck_types::{IconSizeCategory, LauncherItem};
use image::imageops::FilterType;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Straight (non-premultiplied) RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl IconBitmap {
    /// Bitmap filled with one colour.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: rgba.repeat(pixels),
        }
    }
}

/// Resolves a path to a bitmap.
pub trait IconLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the path yields no icon.
    fn load(&self, path: &str, size: IconSizeCategory) -> Result<IconBitmap>;
}

/// Decodes image files (png, ico, bmp, jpeg, gif) and scales them to the
/// size bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileLoader;

impl IconLoader for ImageFileLoader {
    fn load(&self, path: &str, size: IconSizeCategory) -> Result<IconBitmap> {
        let px = size.pixels();
        let img = image::open(Path::new(path)).map_err(|e| Error::Icon(format!("{path}: {e}")))?;
        let rgba = img.resize_exact(px, px, FilterType::Triangle).to_rgba8();
        Ok(IconBitmap {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

/// Try each loader in turn; the first success wins.
pub struct ChainLoader {
    loaders: Vec<Box<dyn IconLoader>>,
}

impl ChainLoader {
    pub fn new(loaders: Vec<Box<dyn IconLoader>>) -> Self {
        Self { loaders }
    }
}

impl IconLoader for ChainLoader {
    fn load(&self, path: &str, size: IconSizeCategory) -> Result<IconBitmap> {
        let mut last_err = Error::Icon(format!("{path}: no loader available"));
        for loader in &self.loaders {
            match loader.load(path, size) {
                Ok(bitmap) => return Ok(bitmap),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

/// Cache key: expanded, trimmed, lower-cased path plus the size bucket.
#[must_use]
pub fn cache_key(path: &str, size: IconSizeCategory) -> String {
    let normalized = expand_env_vars(path.trim()).replace('/', "\\").to_lowercase();
    format!("{normalized}_{}", size.as_str())
}

pub struct IconCache {
    loader: Box<dyn IconLoader>,
    entries: Mutex<HashMap<String, Arc<IconBitmap>>>,
    /// Keys whose load failed; not retried until `clear`
    misses: Mutex<HashSet<String>>,
    defaults: Mutex<HashMap<IconSizeCategory, Arc<IconBitmap>>>,
}

impl IconCache {
    pub fn new(loader: Box<dyn IconLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            misses: Mutex::new(HashSet::new()),
            defaults: Mutex::new(HashMap::new()),
        }
    }

    /// Icon for `item`: custom icon path, then executable, then the default.
    ///
    /// Loading happens outside the lock. When two callers race on the same
    /// key, the first insert wins and both get that bitmap.
    pub fn get_or_add(&self, item: &LauncherItem, size: IconSizeCategory) -> Arc<IconBitmap> {
        let candidates = [item.icon_path.as_str(), item.executable_path.as_str()];
        for path in candidates.into_iter().filter(|p| !p.trim().is_empty()) {
            if let Some(bitmap) = self.get_or_load(path, size) {
                return bitmap;
            }
        }
        self.default_icon(size)
    }

    fn get_or_load(&self, path: &str, size: IconSizeCategory) -> Option<Arc<IconBitmap>> {
        let key = cache_key(path, size);
        if let Some(hit) = self.lock_entries().get(&key) {
            return Some(Arc::clone(hit));
        }
        if self.lock_misses().contains(&key) {
            return None;
        }

        let expanded = expand_env_vars(path.trim());
        match self.loader.load(&expanded, size) {
            Ok(bitmap) => {
                let mut entries = self.lock_entries();
                let entry = entries.entry(key).or_insert_with(|| Arc::new(bitmap));
                Some(Arc::clone(entry))
            }
            Err(e) => {
                debug!("No icon from {expanded}: {e}");
                self.lock_misses().insert(key);
                None
            }
        }
    }

    /// Neutral rounded-square placeholder, cached per size bucket.
    pub fn default_icon(&self, size: IconSizeCategory) -> Arc<IconBitmap> {
        let mut defaults = self.defaults.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            defaults
                .entry(size)
                .or_insert_with(|| Arc::new(placeholder_bitmap(size.pixels()))),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
        self.lock_misses().clear();
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<IconBitmap>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_misses(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.misses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Warm the cache for `items` on a background thread.
    ///
    /// Fire-and-forget: failures are logged, and the thread may outlive the
    /// popup that asked for it.
    pub fn preload(self: &Arc<Self>, items: Vec<LauncherItem>, size: IconSizeCategory) {
        let cache = Arc::clone(self);
        let spawned = std::thread::Builder::new()
            .name("icon-preload".to_string())
            .spawn(move || {
                for item in &items {
                    cache.get_or_add(item, size);
                }
                info!("Preloaded icons for {} items", items.len());
            });
        if let Err(e) = spawned {
            warn!("Failed to start icon preload: {e}");
        }
    }
}

fn placeholder_bitmap(px: u32) -> IconBitmap {
    const FILL: [u8; 4] = [0x6b, 0x72, 0x80, 0xff];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    let radius = px / 5;
    let mut bitmap = IconBitmap::solid(px, px, CLEAR);
    for y in 0..px {
        for x in 0..px {
            let dx = corner_distance(x, px, radius);
            let dy = corner_distance(y, px, radius);
            if dx * dx + dy * dy <= radius * radius {
                let offset = ((y * px + x) * 4) as usize;
                bitmap.rgba[offset..offset + 4].copy_from_slice(&FILL);
            }
        }
    }
    bitmap
}

/// Distance into a rounded corner along one axis, 0 outside the corner band.
fn corner_distance(v: u32, px: u32, radius: u32) -> u32 {
    if v < radius {
        radius - v
    } else if v >= px - radius {
        v + 1 - (px - radius)
    } else {
        0
    }
}
