//! Derivative encoding — pixel work and the derivative write.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Inside-fit resample | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Cover-fit (fill + center crop) | `image::DynamicImage::resize_to_fill` |
//! | Encode → WebP (lossy) | `webp::Encoder` (libwebp; the `image` crate's WebP encoder is lossless-only) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Derivatives are re-encoded from decoded pixels, so no source metadata
//! (EXIF, IPTC, ICC) survives into any output.
//!
//! Encoding is memory-first: [`render`] produces the full encoded byte
//! buffer, and [`write_synced`] creates, writes, and fsyncs the file in one
//! step. No partially encoded derivative is ever observable on disk.

use super::profile::{DerivativeProfile, FitMode, OutputFormat, ProfileKind, Quality};
use super::scale::ScalePlan;
use image::DynamicImage;
use image::imageops::FilterType;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("codec failure: {0}")]
    Codec(String),
    #[error("derivative write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode exceeded the {0}s deadline")]
    TimedOut(u64),
    #[error("abandoned by cancellation")]
    Cancelled,
}

/// One planned encode: which profile, the exact target geometry, and where
/// the file goes.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub profile: DerivativeProfile,
    pub plan: ScalePlan,
    pub output: PathBuf,
}

/// A derivative as written to disk.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub kind: ProfileKind,
    pub path: PathBuf,
    pub size: u64,
}

/// Derivative file name for a source basename: `{stem}{suffix}.{ext}`.
pub fn derivative_file_name(stem: &str, profile: &DerivativeProfile) -> String {
    format!("{stem}{}.{}", profile.suffix, profile.format.extension())
}

/// Transform and encode one derivative entirely in memory.
///
/// An inside-fit job with `resize_required = false` skips the resample and
/// transcodes the decoded pixels as-is (the planner's no-upscale guarantee).
/// Inside-fit resamples use `resize_exact` so the planner's rounded
/// dimensions drive the output geometry, not the resampler's own ratio math.
pub fn render(img: &DynamicImage, job: &EncodeJob) -> Result<Vec<u8>, EncodeError> {
    let resampled = match (job.profile.fit, job.plan.resize_required) {
        (FitMode::Inside, false) => None,
        (FitMode::Inside, true) => Some(img.resize_exact(
            job.plan.width,
            job.plan.height,
            FilterType::Lanczos3,
        )),
        (FitMode::Cover, _) => Some(img.resize_to_fill(
            job.plan.width,
            job.plan.height,
            FilterType::Lanczos3,
        )),
    };
    let pixels = resampled.as_ref().unwrap_or(img);
    encode_bytes(pixels, job.profile.format, job.profile.quality)
}

fn encode_bytes(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, EncodeError> {
    match format {
        OutputFormat::WebP => {
            // libwebp takes RGB8/RGBA8 input only; other sample layouts
            // (Luma8, 16-bit) convert first.
            let converted;
            let source = match img {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
                _ => {
                    converted = DynamicImage::ImageRgba8(img.to_rgba8());
                    &converted
                }
            };
            let encoder = webp::Encoder::from_image(source)
                .map_err(|e| EncodeError::Codec(format!("WebP encode failed: {e}")))?;
            Ok(encoder.encode(quality.value() as f32).to_vec())
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel; flatten to RGB8 first.
            let rgb = img.to_rgb8();
            let mut bytes = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                std::io::Cursor::new(&mut bytes),
                quality.value() as u8,
            );
            encoder
                .encode_image(&rgb)
                .map_err(|e| EncodeError::Codec(format!("JPEG encode failed: {e}")))?;
            Ok(bytes)
        }
    }
}

/// Write an encoded derivative, silently overwriting any existing file, and
/// flush it durably before returning. Source deletion is ordered after this
/// sync, not after the write call alone.
pub fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
