// src/app/gfx.rs
use std::path::Path;

use eframe::egui::{self as eg, ColorImage, TextureHandle};

/// Upload an RGBA image to a GPU texture. (UI thread only)
pub fn upload_rgba(
    ctx: &eg::Context,
    w: u32,
    h: u32,
    bytes: &[u8],
    name: &str,
) -> TextureHandle {
    let img = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], bytes);
    ctx.load_texture(name.to_string(), img, eg::TextureOptions::LINEAR)
}

/// Load a texture from a cached poster file; rejects images that are not
/// roughly 2:3 portrait. (UI thread only)
pub fn load_texture_from_path(
    ctx: &eg::Context,
    path: &Path,
    cache_name: &str,
) -> Result<TextureHandle, String> {
    let (w, h, bytes) = crate::app::cache::load_rgba_raw_or_image(path)?;
    check_poster_aspect(w, h)?;
    Ok(upload_rgba(ctx, w, h, &bytes, cache_name))
}

fn check_poster_aspect(w: u32, h: u32) -> Result<(), String> {
    let ar = (w as f32) / (h.max(1) as f32);
    if (0.55..=0.80).contains(&ar) {
        Ok(())
    } else {
        Err(format!("non-poster aspect {w}x{h} ar={ar:.2}"))
    }
}
