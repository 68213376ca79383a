//! # imgpress
//!
//! Image derivative pipeline for storefront uploads. Given a just-written
//! raster file, imgpress deterministically produces three purpose-built
//! renditions and retires the original:
//!
//! | Rendition | Box | Fit | Format | Use |
//! |-----------|-----|-----|--------|-----|
//! | web | 1920×1920 | inside (never upscale) | WebP q75 | storefront product pages |
//! | dashboard | 800×800 | inside (never upscale) | WebP q75 | admin dashboard |
//! | thumbnail | 300×300 | cover (center crop) | JPEG q75 | grid thumbnails |
//!
//! # Architecture: Four-Stage Pipeline
//!
//! Every upload flows through four stages in strict sequence:
//!
//! ```text
//! 1. Probe     header read                 → intrinsic width/height
//! 2. Plan      pure math                   → exact target per profile
//! 3. Encode    concurrent, one per profile → three files on disk
//! 4. Finalize  join point                  → confirm web, retire original
//! ```
//!
//! The split exists for three reasons:
//!
//! - **Fail fast and safe**: unreadable files and corrupt geometry are
//!   rejected before any pixel work, with the original untouched.
//! - **Testability**: planning is pure math, unit-tested without images;
//!   encoding is exercised against synthetic pixels.
//! - **Isolation of failure**: each profile encodes independently, so one
//!   bad encode costs one rendition, not the upload.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestration: the four stages, concurrency, the degraded contract, batch fan-out |
//! | [`imaging`] | Pixel work: probing, fit math, profile table, encoding |
//! | [`category`] | Public URL prefixes per upload category |
//! | [`config`] | `imgpress.toml` loading, validation, worker-count resolution |
//! | [`output`] | CLI report formatting (pure `format_*` functions) |
//!
//! # Design Decisions
//!
//! ## The Caller Never Loses an Upload
//!
//! [`pipeline::process_upload`] is infallible. Success returns the web
//! rendition and URLs; any fatal failure returns the original file's
//! path/size with `processed = false`. An upload is never lost because
//! derivative generation failed, and a half-written derivative is never
//! reported as complete.
//!
//! ## Write, Confirm, Then Delete
//!
//! The original is deleted only after the web rendition's bytes are fsynced
//! and a fresh stat confirms a non-empty file. Either the original survives
//! or the web rendition exists; never neither.
//!
//! ## Pure-Rust Imaging, One Encode Routine
//!
//! Decoding, Lanczos3 resampling, and JPEG encoding come from the `image`
//! crate; lossy WebP comes from the `webp` crate (the `image` crate's WebP
//! encoder is lossless-only). The three renditions are rows in a profile
//! table driving a single parameterized encode routine. Derivatives are
//! re-encoded from decoded pixels, so EXIF/IPTC/ICC metadata never reaches
//! an output file.
//!
//! ## Decode Once, Encode Concurrently
//!
//! One decode feeds all three encoders, which run on their own threads
//! under a per-file deadline. Batch uploads are independent pipeline
//! instances fanned out over a rayon pool sized by
//! [`config::effective_threads`].

pub mod category;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;

pub use category::Category;
pub use config::PipelineConfig;
pub use pipeline::{PipelineError, UploadOutcome, process_batch, process_upload};
