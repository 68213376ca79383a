//! Pure scale planning for derivative generation.
//!
//! All functions here are pure and testable without any I/O or pixels.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleError {
    #[error("invalid source dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Intrinsic pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A profile's target box: maximum extent for `inside` fit, exact extent
/// for `cover` fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

/// Output of the planner: the exact dimensions to produce and whether a
/// resample pass is needed to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalePlan {
    pub width: u32,
    pub height: u32,
    pub resize_required: bool,
}

/// Plan an `inside` fit: shrink to fit within `bound` preserving aspect
/// ratio, never enlarging.
///
/// A source already within the bound keeps its exact dimensions and needs no
/// resample. Otherwise the scale ratio is the smaller of the two per-axis
/// ratios, so the larger axis lands on the bound (within rounding) and the
/// other stays proportional.
///
/// # Examples
/// ```
/// # use imgpress::imaging::{plan_inside, BoundingBox, Dimensions};
/// // 4000x3000 into 1920x1920 → 1920x1440
/// let plan = plan_inside(
///     Dimensions { width: 4000, height: 3000 },
///     BoundingBox { width: 1920, height: 1920 },
/// ).unwrap();
/// assert_eq!((plan.width, plan.height), (1920, 1440));
/// assert!(plan.resize_required);
/// ```
pub fn plan_inside(source: Dimensions, bound: BoundingBox) -> Result<ScalePlan, ScaleError> {
    validate(source)?;

    if source.width <= bound.width && source.height <= bound.height {
        return Ok(ScalePlan {
            width: source.width,
            height: source.height,
            resize_required: false,
        });
    }

    let ratio = f64::min(
        bound.width as f64 / source.width as f64,
        bound.height as f64 / source.height as f64,
    );
    Ok(ScalePlan {
        width: scaled(source.width, ratio),
        height: scaled(source.height, ratio),
        resize_required: true,
    })
}

/// Plan a `cover` fit: fill `bound` exactly, cropping center overflow.
///
/// The target is always the full box, whatever the source dimensions — a
/// smaller source is enlarged to fill. `resize_required` is therefore always
/// true for this mode.
pub fn plan_cover(source: Dimensions, bound: BoundingBox) -> Result<ScalePlan, ScaleError> {
    validate(source)?;
    Ok(ScalePlan {
        width: bound.width,
        height: bound.height,
        resize_required: true,
    })
}

fn validate(source: Dimensions) -> Result<(), ScaleError> {
    if source.width == 0 || source.height == 0 {
        return Err(ScaleError::InvalidDimensions {
            width: source.width,
            height: source.height,
        });
    }
    Ok(())
}

/// Scale one axis, rounding to the nearest pixel. Extreme aspect ratios can
/// round an axis to zero; those clamp to 1px.
fn scaled(extent: u32, ratio: f64) -> u32 {
    ((extent as f64 * ratio).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn bound(width: u32, height: u32) -> BoundingBox {
        BoundingBox { width, height }
    }

    // =========================================================================
    // plan_inside tests
    // =========================================================================

    #[test]
    fn inside_fits_exactly_no_resize() {
        let plan = plan_inside(dims(200, 200), bound(1920, 1920)).unwrap();
        assert_eq!((plan.width, plan.height), (200, 200));
        assert!(!plan.resize_required);
    }

    #[test]
    fn inside_at_bound_edge_no_resize() {
        let plan = plan_inside(dims(1920, 1920), bound(1920, 1920)).unwrap();
        assert_eq!((plan.width, plan.height), (1920, 1920));
        assert!(!plan.resize_required);
    }

    #[test]
    fn inside_landscape_downscale() {
        // 4000x3000 → ratio 0.48 → 1920x1440
        let plan = plan_inside(dims(4000, 3000), bound(1920, 1920)).unwrap();
        assert_eq!((plan.width, plan.height), (1920, 1440));
        assert!(plan.resize_required);
    }

    #[test]
    fn inside_portrait_downscale() {
        // 3000x4000 → ratio 0.48 → 1440x1920
        let plan = plan_inside(dims(3000, 4000), bound(1920, 1920)).unwrap();
        assert_eq!((plan.width, plan.height), (1440, 1920));
        assert!(plan.resize_required);
    }

    #[test]
    fn inside_one_axis_over() {
        // Width fits, height does not: height drives the ratio.
        let plan = plan_inside(dims(1000, 2400), bound(1920, 1920)).unwrap();
        assert_eq!((plan.width, plan.height), (800, 1920));
        assert!(plan.resize_required);
    }

    #[test]
    fn inside_larger_axis_lands_on_bound() {
        let plan = plan_inside(dims(3333, 2100), bound(800, 800)).unwrap();
        assert_eq!(plan.width.max(plan.height), 800);
    }

    #[test]
    fn inside_preserves_aspect_within_one_percent() {
        let src = dims(3333, 2100);
        let plan = plan_inside(src, bound(800, 800)).unwrap();
        let src_aspect = src.width as f64 / src.height as f64;
        let out_aspect = plan.width as f64 / plan.height as f64;
        assert!((out_aspect - src_aspect).abs() / src_aspect < 0.01);
    }

    #[test]
    fn inside_rounds_to_nearest_pixel() {
        // 1001x1000 into 800x800: 1000 * (800/1001) = 799.2 → 799
        let plan = plan_inside(dims(1001, 1000), bound(800, 800)).unwrap();
        assert_eq!((plan.width, plan.height), (800, 799));
    }

    #[test]
    fn inside_extreme_aspect_clamps_to_one_pixel() {
        // 10000x2 into 300x300: short axis would round to 0
        let plan = plan_inside(dims(10_000, 2), bound(300, 300)).unwrap();
        assert_eq!((plan.width, plan.height), (300, 1));
    }

    #[test]
    fn inside_zero_width_rejected() {
        let err = plan_inside(dims(0, 100), bound(800, 800)).unwrap_err();
        assert_eq!(
            err,
            ScaleError::InvalidDimensions {
                width: 0,
                height: 100
            }
        );
    }

    #[test]
    fn inside_zero_height_rejected() {
        assert!(plan_inside(dims(100, 0), bound(800, 800)).is_err());
    }

    // =========================================================================
    // plan_cover tests
    // =========================================================================

    #[test]
    fn cover_always_targets_full_box() {
        let plan = plan_cover(dims(4000, 3000), bound(300, 300)).unwrap();
        assert_eq!((plan.width, plan.height), (300, 300));
        assert!(plan.resize_required);
    }

    #[test]
    fn cover_smaller_source_still_targets_full_box() {
        // 200x200 under a 300x300 box: cover enlarges, unlike inside
        let plan = plan_cover(dims(200, 200), bound(300, 300)).unwrap();
        assert_eq!((plan.width, plan.height), (300, 300));
        assert!(plan.resize_required);
    }

    #[test]
    fn cover_zero_dimension_rejected() {
        assert!(plan_cover(dims(0, 0), bound(300, 300)).is_err());
    }
}
