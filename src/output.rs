//! CLI output formatting.
//!
//! Each report has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ```text
//! photo.jpg
//!     web: /uploads/projects/photo.webp (184.2 KB)
//!     dashboard: /uploads/projects/photo_dashboard.webp
//!     thumbnail: /uploads/projects/photo_thumb.jpg
//! ```

use crate::imaging::{DerivativeProfile, Dimensions, ScalePlan};
use crate::pipeline::{BatchItem, UploadOutcome};
use std::path::Path;

/// Human-readable byte size: `512 B`, `184.2 KB`, `3.1 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

fn source_header(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

/// Report for one processed (or degraded) upload.
pub fn format_outcome(source: &Path, outcome: &UploadOutcome) -> Vec<String> {
    let mut lines = vec![source_header(source)];
    if outcome.processed {
        if let Some(url) = &outcome.web_url {
            lines.push(format!(
                "    web: {url} ({})",
                format_file_size(outcome.size)
            ));
        }
        match &outcome.dashboard_url {
            Some(url) => lines.push(format!("    dashboard: {url}")),
            None => lines.push("    dashboard: failed".to_string()),
        }
        match &outcome.thumbnail {
            Some(url) => lines.push(format!("    thumbnail: {url}")),
            None => lines.push("    thumbnail: failed".to_string()),
        }
    } else {
        lines.push(format!(
            "    not processed, original kept ({})",
            format_file_size(outcome.size)
        ));
    }
    lines
}

pub fn print_outcome(source: &Path, outcome: &UploadOutcome) {
    for line in format_outcome(source, outcome) {
        println!("{line}");
    }
}

/// Per-file reports plus a processed/total summary line.
pub fn format_batch(items: &[BatchItem]) -> Vec<String> {
    let mut lines = Vec::new();
    for item in items {
        lines.extend(format_outcome(&item.source, &item.outcome));
    }
    let processed = items.iter().filter(|i| i.outcome.processed).count();
    if !items.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("Processed {processed} of {} images", items.len()));
    lines
}

pub fn print_batch(items: &[BatchItem]) {
    for line in format_batch(items) {
        println!("{line}");
    }
}

/// Probe report: intrinsic geometry and the derivative targets it plans to.
pub fn format_probe_report(
    source: &Path,
    dims: Dimensions,
    plans: &[(DerivativeProfile, ScalePlan)],
) -> Vec<String> {
    let mut lines = vec![
        source_header(source),
        format!("    intrinsic: {}x{}", dims.width, dims.height),
    ];
    for (profile, plan) in plans {
        let action = if plan.resize_required {
            "resample"
        } else {
            "transcode only"
        };
        lines.push(format!(
            "    {}: {}x{} {} q{} ({action})",
            profile.kind.name(),
            plan.width,
            plan.height,
            profile.format.extension(),
            profile.quality.value(),
        ));
    }
    lines
}

pub fn print_probe_report(
    source: &Path,
    dims: Dimensions,
    plans: &[(DerivativeProfile, ScalePlan)],
) {
    for line in format_probe_report(source, dims, plans) {
        println!("{line}");
    }
}
