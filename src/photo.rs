//! Local photo staging for the upload flow.
//!
//! Captured or selected images are staged into a cache directory before
//! upload; oversized images are downscaled and re-encoded as JPEG first.

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use image::{GenericImageView, ImageOutputFormat};

use crate::config::Config;

const CACHE_SUBDIR: &str = "teledex/img";
/// Largest edge kept when re-encoding an oversized capture.
const MAX_EDGE: u32 = 1280;
const JPEG_QUALITY: u8 = 85;

/// Fallback asset reference for display layers with no photo to load.
pub const PLACEHOLDER_ASSET: &str = "assets/placeholder_image.png";

pub fn staging_dir(config: &Config) -> Result<PathBuf> {
    let dir = match &config.cache_dir {
        Some(dir) => dir.join("img"),
        None => {
            let base = BaseDirs::new().context("unable to determine cache directory")?;
            base.cache_dir().join(CACHE_SUBDIR)
        }
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write captured photo bytes to a staged file and return its path.
///
/// The stream is opened, written, flushed, and closed before the path is
/// handed to anyone.
pub fn stage_photo(config: &Config, bytes: &[u8]) -> Result<PathBuf> {
    let path = staging_dir(config)?.join(format!("{}.jpg", uuid::Uuid::new_v4()));
    {
        let mut file = File::create(&path)
            .with_context(|| format!("failed to create staged photo at {}", path.display()))?;
        file.write_all(bytes)?;
        file.flush()?;
    }
    Ok(path)
}

/// Read a photo file and produce the bytes and file name to upload.
///
/// Decodable images wider or taller than `MAX_EDGE` are downscaled and
/// re-encoded as JPEG; everything else is passed through untouched.
pub fn prepare_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read photo file {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo.jpg".to_string());

    match image::load_from_memory(&bytes) {
        Ok(img) if img.width().max(img.height()) > MAX_EDGE => {
            let scaled = img.thumbnail(MAX_EDGE, MAX_EDGE);
            let mut out = Vec::new();
            scaled.write_to(
                &mut Cursor::new(&mut out),
                ImageOutputFormat::Jpeg(JPEG_QUALITY),
            )?;
            let jpeg_name = match file_name.rsplit_once('.') {
                Some((stem, _)) => format!("{stem}.jpg"),
                None => format!("{file_name}.jpg"),
            };
            Ok((out, jpeg_name))
        }
        // Small enough, or not an image we can decode: the server decides.
        _ => Ok((bytes, file_name)),
    }
}
