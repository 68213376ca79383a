//! Source image probing — header-only dimension reads.

use super::scale::Dimensions;
use image::ImageFormat;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("cannot read {path} as a raster image: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Extensions whose decoders are compiled in and known to work.
const RASTER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    RASTER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders
/// compiled in. Used by batch discovery to skip non-image files without
/// opening them.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True if the path's extension names a decodable raster format.
pub fn is_raster_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| ext.eq_ignore_ascii_case(s))
        })
}

/// Read the intrinsic dimensions of an image from its header.
///
/// `image::image_dimensions` sniffs the actual container format and parses
/// only as much as needed for geometry — no pixel decode, no re-encode.
pub fn probe(path: &Path) -> Result<Dimensions, ProbeError> {
    let (width, height) = image::image_dimensions(path).map_err(|e| ProbeError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Dimensions { width, height })
}
