// src/app/cache.rs
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use reqwest::blocking::Client;
use tracing::{info, warn};

const POSTER_RETENTION_DAYS: u64 = 14;
const POSTER_RETENTION: Duration = Duration::from_secs(POSTER_RETENTION_DAYS * 24 * 60 * 60);

/// On-disk poster cache under `<cache_dir>/posters`, keyed by the md5 of the URL.
#[derive(Clone, Debug)]
pub struct PosterCache {
    dir: PathBuf,
}

impl PosterCache {
    /// Create the directory if needed and drop posters past retention.
    pub fn open(cache_dir: &Path) -> Self {
        let mut dir = cache_dir.join("posters");
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("failed to create poster cache dir {}: {e}", dir.display());
            dir = cache_dir.to_path_buf();
            let _ = fs::create_dir_all(&dir);
        }
        match prune_in_dir(&dir, POSTER_RETENTION) {
            Ok(0) => {}
            Ok(n) => info!("pruned {n} stale poster(s) from {}", dir.display()),
            Err(err) => warn!("poster cache prune failed: {err}"),
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn find(&self, key: &str) -> Option<PathBuf> {
        ["jpg", "png", "rgba"]
            .iter()
            .map(|ext| self.dir.join(format!("{key}.{ext}")))
            .find(|p| p.exists())
    }
}

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Remove cached images older than `retention`, plus leftover `.part` files.
pub fn prune_in_dir(dir: &Path, retention: Duration) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
        else {
            continue;
        };
        let modified = entry.metadata()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let stale = match ext.as_str() {
            "part" => true,
            "png" | "jpg" | "jpeg" | "rgba" => modified < cutoff,
            _ => false,
        };
        if stale {
            let _ = fs::remove_file(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

/// Return (width, height, RGBA8 bytes) from an image file or a raw `.rgba`
/// file (8-byte header: u32 LE width, u32 LE height, then pixels).
pub fn load_rgba_raw_or_image(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    if !path.exists() {
        return Err("not found".into());
    }
    let is_raw = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("rgba"));
    if is_raw {
        let mut f = fs::File::open(path).map_err(|e| format!("open rgba: {e}"))?;
        let mut header = [0u8; 8];
        f.read_exact(&mut header)
            .map_err(|e| format!("read header: {e}"))?;
        let w = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let h = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .map_err(|e| format!("read body: {e}"))?;
        if w == 0 || h == 0 || buf.len() != (w as usize) * (h as usize) * 4 {
            return Err(format!("bad rgba payload {w}x{h}"));
        }
        return Ok((w, h, buf));
    }
    let img = image::ImageReader::open(path)
        .map_err(|e| format!("open image {}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("guess format {}: {e}", path.display()))?
        .decode()
        .map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().into_raw()))
}

/// Shrink to `max_width` (keeping aspect) and encode as JPEG.
pub fn resize_to_jpeg(img: DynamicImage, max_width: u32, quality: u8) -> Result<Vec<u8>, String> {
    let (w, h) = img.dimensions();
    let out = if w > max_width {
        let new_h = ((h as f32) * (max_width as f32 / w as f32))
            .round()
            .max(1.0) as u32;
        img.resize_exact(max_width, new_h, FilterType::CatmullRom)
    } else {
        img
    };

    let mut jpeg_bytes: Vec<u8> = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality);
    encoder
        .encode_image(&out.to_rgb8())
        .map_err(|e| format!("jpeg encode: {e}"))?;
    Ok(jpeg_bytes)
}

/// Download a poster with a shared client, resize it and store it as
/// `<dir>/<key>.jpg`. Returns the cached path immediately when present.
pub fn download_and_store_resized_with_client(
    client: &Client,
    dir: &Path,
    url: &str,
    key: &str,
    max_width: u32,
    quality: u8,
) -> Result<PathBuf, String> {
    let dest = dir.join(format!("{key}.jpg"));
    if dest.exists() {
        return Ok(dest);
    }

    let bytes = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| format!("download {url}: {e}"))?;

    let img = image::load_from_memory(&bytes).map_err(|e| format!("decode {url}: {e}"))?;
    let jpeg_bytes = resize_to_jpeg(img, max_width, quality)?;
    write_atomically(&dest, &jpeg_bytes)?;
    Ok(dest)
}

fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = dest.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = dest.with_extension("jpg.part");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
        f.write_all(bytes).map_err(|e| format!("write: {e}"))?;
    }
    fs::rename(&tmp, dest).map_err(|e| format!("rename: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn cache_key_is_stable_md5_hex() {
        let a = url_to_cache_key("https://image.tmdb.org/t/p/w342/a.jpg");
        assert_eq!(a.len(), 32);
        assert_eq!(a, url_to_cache_key("https://image.tmdb.org/t/p/w342/a.jpg"));
        assert_ne!(a, url_to_cache_key("https://image.tmdb.org/t/p/w342/b.jpg"));
    }

    #[test]
    fn prune_drops_old_and_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.jpg");
        let old = dir.path().join("old.jpg");
        let part = dir.path().join("x.jpg.part");
        let other = dir.path().join("notes.txt");
        for p in [&fresh, &old, &part, &other] {
            fs::write(p, b"x").unwrap();
        }
        let long_ago = SystemTime::now() - Duration::from_secs(30 * 24 * 3600);
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(long_ago)
            .unwrap();

        let removed = prune_in_dir(dir.path(), POSTER_RETENTION).unwrap();
        assert_eq!(removed, 2);
        assert!(fresh.exists());
        assert!(!old.exists());
        assert!(!part.exists());
        assert!(other.exists());
    }

    #[test]
    fn resize_keeps_aspect() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(600, 900, Rgba([10, 20, 30, 255])));
        let jpeg = resize_to_jpeg(img, 300, 80).unwrap();
        let back = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(back.dimensions(), (300, 450));
    }

    #[test]
    fn find_and_load_cached_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PosterCache::open(dir.path());
        assert!(cache.find("abc").is_none());

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 30, Rgba([0, 0, 0, 255])));
        let jpeg = resize_to_jpeg(img, 100, 90).unwrap();
        write_atomically(&cache.dir().join("abc.jpg"), &jpeg).unwrap();

        let path = cache.find("abc").unwrap();
        let (w, h, bytes) = load_rgba_raw_or_image(&path).unwrap();
        assert_eq!((w, h), (20, 30));
        assert_eq!(bytes.len(), 20 * 30 * 4);
    }
}
