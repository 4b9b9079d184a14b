//! Photo import
//!
//! Stands in for the camera: decodes a photo from disk, corrects its
//! orientation and stores it as a JPEG under the photos directory. The
//! returned path is what gets registered with `Store::add_image_to_item`.

use std::path::{Path, PathBuf};

use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Rgb, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::orientation::{PixelBuffer, Rotation};
use crate::storage::fs::{atomic_write, ensure_dir, unique_path};
use crate::storage::StorageError;

/// Errors that can occur while importing a photo
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The source could not be read or decoded
    #[error("Failed to decode photo '{path}': {details}")]
    Decode { path: PathBuf, details: String },

    /// The corrected photo could not be encoded
    #[error("Failed to encode photo '{path}': {details}")]
    Encode { path: PathBuf, details: String },

    /// Filesystem failure writing the photo
    #[error(transparent)]
    Io(#[from] StorageError),
}

/// Import `source` into `photos_dir`, rotated clockwise by `rotation_degrees`
pub fn import_photo(
    source: &Path,
    rotation_degrees: i32,
    photos_dir: &Path,
    jpeg_quality: u8,
) -> Result<PathBuf, CaptureError> {
    let decoded = ImageReader::open(source)
        .map_err(|e| CaptureError::Decode {
            path: source.to_path_buf(),
            details: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| CaptureError::Decode {
            path: source.to_path_buf(),
            details: e.to_string(),
        })?
        .decode()
        .map_err(|e| CaptureError::Decode {
            path: source.to_path_buf(),
            details: e.to_string(),
        })?
        .to_rgb8();

    let rotation = Rotation::from_degrees(rotation_degrees);
    let photo = if rotation == Rotation::None {
        decoded
    } else {
        debug!("Rotating {:?} by {} degrees", source, rotation.degrees());
        let buffer = to_pixel_buffer(&decoded).ok_or_else(|| CaptureError::Decode {
            path: source.to_path_buf(),
            details: "pixel count does not match dimensions".to_string(),
        })?;
        from_pixel_buffer(&buffer.rotated(rotation))
    };

    ensure_dir(photos_dir)?;
    let stem = format!("photo_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let target = unique_path(photos_dir, &stem, "jpg");

    write_jpeg(&photo, &target, jpeg_quality)?;
    info!("Imported photo {:?} -> {:?}", source, target);
    Ok(target)
}

fn to_pixel_buffer(image: &RgbImage) -> Option<PixelBuffer<Rgb<u8>>> {
    let (width, height) = image.dimensions();
    let pixels = image.pixels().copied().collect();
    PixelBuffer::new(width as usize, height as usize, pixels)
}

fn from_pixel_buffer(buffer: &PixelBuffer<Rgb<u8>>) -> RgbImage {
    RgbImage::from_fn(buffer.width() as u32, buffer.height() as u32, |x, y| {
        buffer.pixels()[y as usize * buffer.width() + x as usize]
    })
}

/// Encodes in memory, then writes atomically; a failed encode writes nothing
fn write_jpeg(photo: &RgbImage, target: &Path, quality: u8) -> Result<(), CaptureError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(photo)
        .map_err(|e| CaptureError::Encode {
            path: target.to_path_buf(),
            details: e.to_string(),
        })?;

    atomic_write(target, &bytes)?;
    Ok(())
}
