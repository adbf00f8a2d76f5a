// src/pipeline/images.rs

//! `images/*.{jpg,jpeg,gif,png}` -> `assets/images/`.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, ImageFormat};
use tracing::debug;

use crate::config::BuildContext;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::source::{file_matcher, file_name, matching_files};
use crate::pipeline::{AssetKind, OutputFile};

pub fn transform(ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<OutputFile>> {
    let kind = AssetKind::Images;
    let matcher = file_matcher(&kind.file_glob())?;
    let inputs = matching_files(fs, &ctx.paths.source_dir(kind.name()), &matcher)?;

    let mut outputs = Vec::with_capacity(inputs.len());
    for path in inputs {
        let original = fs.read(&path)?;

        let bytes = if ctx.mode.is_prod() {
            compress(&path, &original, ctx.settings.images.jpeg_quality)
                .map_err(|e| SitepipeError::transform(kind.name(), &path, e))?
        } else {
            original
        };

        outputs.push(OutputFile::new(
            Path::new(kind.output_dir()).join(file_name(&path)),
            bytes,
        ));
    }
    Ok(outputs)
}

/// Re-encode PNG and JPEG; keep whichever of old and new is smaller.
fn compress(path: &Path, original: &[u8], jpeg_quality: u8) -> std::result::Result<Vec<u8>, String> {
    let Ok(format) = ImageFormat::from_path(path) else {
        return Ok(original.to_vec());
    };

    let encoded = match format {
        ImageFormat::Png => encode_png(original)?,
        ImageFormat::Jpeg => encode_jpeg(original, jpeg_quality)?,
        _ => return Ok(original.to_vec()),
    };

    if encoded.len() < original.len() {
        debug!(path = ?path, before = original.len(), after = encoded.len(), "image compressed");
        Ok(encoded)
    } else {
        debug!(path = ?path, "re-encoding did not shrink image; keeping original");
        Ok(original.to_vec())
    }
}

fn encode_png(original: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(original, ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .map_err(|e| e.to_string())?;
    Ok(out)
}

fn encode_jpeg(original: &[u8], quality: u8) -> std::result::Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(original, ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&img.to_rgb8())
        .map_err(|e| e.to_string())?;
    Ok(out)
}
