//! Image work for the derivative pipeline.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::image_dimensions` (header read, no decode) |
//! | **Scale planning** | pure math, no I/O |
//! | **Resample** | `resize_exact` / `resize_to_fill` with Lanczos3 |
//! | **Encode WebP** | `webp` crate (libwebp, lossy) |
//! | **Encode JPEG** | `image` crate encoder |
//!
//! The module is split into:
//! - **scale**: pure functions for fit/dimension math (unit testable)
//! - **profile**: the derivative target table (what to produce)
//! - **probe**: header-only dimension reads and format support
//! - **encode**: pixel work, in-memory encoding, the fsync'd write

pub mod encode;
pub mod probe;
pub mod profile;
pub mod scale;

pub use encode::{Derivative, EncodeError, EncodeJob, derivative_file_name, render, write_synced};
pub use probe::{ProbeError, is_raster_candidate, probe, supported_input_extensions};
pub use profile::{DerivativeProfile, FitMode, OutputFormat, ProfileKind, Quality, STOCK_PROFILES};
pub use scale::{BoundingBox, Dimensions, ScaleError, ScalePlan, plan_cover, plan_inside};
