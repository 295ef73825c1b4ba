//! I/O helpers for grayscale frames and JSON.
//!
//! - `load_grayscale_image`: read a PNG/JPEG into an owned 8-bit gray buffer.
//! - `GrayFrame::downscale`: Lanczos3 resize by the detector's initial scale.
//! - `load_json_file` / `write_json_file`: read a generic tree, pretty-print a
//!   serializable value.
use super::GrayView;
use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Owned 8-bit grayscale buffer, contiguous rows.
#[derive(Clone, Debug)]
pub struct GrayFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayFrame {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_view(&self) -> GrayView<'_> {
        GrayView {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    /// Resizes by `factor`, truncating the target dimensions. A factor of 1
    /// returns a copy.
    pub fn downscale(&self, factor: f32) -> Result<GrayFrame, String> {
        let width = (self.width as f32 * factor) as u32;
        let height = (self.height as f32 * factor) as u32;
        if width == 0 || height == 0 {
            return Err(format!(
                "Scale {factor} collapses {}x{} to an empty image",
                self.width, self.height
            ));
        }
        if width as usize == self.width && height as usize == self.height {
            return Ok(self.clone());
        }
        let src = GrayImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
            .ok_or_else(|| "Failed to create image buffer".to_string())?;
        let out = imageops::resize(&src, width, height, FilterType::Lanczos3);
        Ok(GrayFrame::new(width as usize, height as usize, out.into_raw()))
    }
}

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayFrame, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    Ok(GrayFrame::new(width, height, img.into_raw()))
}

/// Read a JSON document into a generic tree.
pub fn load_json_file(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
