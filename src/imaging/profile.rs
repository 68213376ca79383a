//! Derivative profile table.
//!
//! A profile describes *what* to produce, not *how*: target box, fit mode,
//! output format, encoder quality, filename suffix. The three stock profiles
//! drive one parameterized encode routine — there are no per-profile code
//! paths.

use super::scale::BoundingBox;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// The three derivatives every upload produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// Large storefront rendition.
    Web,
    /// Medium admin-dashboard rendition.
    Dashboard,
    /// Fixed-box grid thumbnail.
    Thumbnail,
}

impl ProfileKind {
    pub fn name(self) -> &'static str {
        match self {
            ProfileKind::Web => "web",
            ProfileKind::Dashboard => "dashboard",
            ProfileKind::Thumbnail => "thumbnail",
        }
    }
}

/// How a source maps into the profile's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Shrink to fit within the box preserving aspect ratio; never enlarge.
    Inside,
    /// Fill the exact box, cropping center overflow; enlarges if needed.
    Cover,
}

/// Output encoding for a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// One derivative target: everything the encoder needs besides pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeProfile {
    pub kind: ProfileKind,
    pub bound: BoundingBox,
    pub fit: FitMode,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Appended to the source basename before the extension. Empty for the
    /// primary rendition, which keeps the bare basename.
    pub suffix: &'static str,
}

/// The fixed profile table: web, dashboard, thumbnail — in that order.
///
/// Order matters to the planner: the dashboard resize decision is coupled to
/// the web decision (see [`pipeline`](crate::pipeline)), so web comes first.
pub const STOCK_PROFILES: [DerivativeProfile; 3] = [
    DerivativeProfile {
        kind: ProfileKind::Web,
        bound: BoundingBox {
            width: 1920,
            height: 1920,
        },
        fit: FitMode::Inside,
        format: OutputFormat::WebP,
        quality: Quality(75),
        suffix: "",
    },
    DerivativeProfile {
        kind: ProfileKind::Dashboard,
        bound: BoundingBox {
            width: 800,
            height: 800,
        },
        fit: FitMode::Inside,
        format: OutputFormat::WebP,
        quality: Quality(75),
        suffix: "_dashboard",
    },
    DerivativeProfile {
        kind: ProfileKind::Thumbnail,
        bound: BoundingBox {
            width: 300,
            height: 300,
        },
        fit: FitMode::Cover,
        format: OutputFormat::Jpeg,
        quality: Quality(75),
        suffix: "_thumb",
    },
];
