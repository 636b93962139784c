//! I/O helpers for colour frames and JSON.
//!
//! - `load_color_image`: read a JPEG/PNG, optionally rescaled by a percentage.
//! - `save_rgb`: write debug images, creating parents.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::error::{MeasureError, MeasureResult};
use image::imageops::FilterType;
use image::RgbImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk as RGB and resize it to `scale_percent` of its
/// size (100 keeps it untouched). Unreadable or missing files are reported
/// as missing input.
pub fn load_color_image(path: &Path, scale_percent: u32) -> MeasureResult<RgbImage> {
    if !path.is_file() {
        return Err(MeasureError::missing_input(path));
    }
    let img = image::open(path)
        .map_err(|e| {
            log::debug!("load_color_image: decode failed for {}: {e}", path.display());
            MeasureError::missing_input(path)
        })?
        .into_rgb8();
    Ok(scale_image(img, scale_percent))
}

/// Resize by an integer percentage, truncating the target size.
pub fn scale_image(img: RgbImage, scale_percent: u32) -> RgbImage {
    if scale_percent == 100 || scale_percent == 0 {
        return img;
    }
    let w = (img.width() as u64 * scale_percent as u64 / 100).max(1) as u32;
    let h = (img.height() as u64 * scale_percent as u64 / 100).max(1) as u32;
    image::imageops::resize(&img, w, h, FilterType::Triangle)
}

pub fn save_rgb(image: &RgbImage, path: &Path) -> MeasureResult<()> {
    ensure_parent_dir(path)?;
    image.save(path).map_err(|source| MeasureError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> MeasureResult<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        MeasureError::config(format!("failed to serialize JSON for {}: {e}", path.display()))
    })?;
    fs::write(path, json)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> MeasureResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
