//! The derivative pipeline: probe → plan → encode ×3 → finalize.
//!
//! One invocation handles one uploaded file. The source is probed (header
//! read), the three profile targets are planned (pure math), the decoded
//! pixels are encoded into the three derivatives concurrently, and the
//! finalizer joins the results, confirms the primary rendition on disk, and
//! retires the original.
//!
//! ```text
//! upload.jpg ──probe──▶ 4000x3000 ──plan──▶ web 1920x1440
//!                                           dashboard 800x600      ──encode×3──▶ finalize
//!                                           thumbnail 300x300 (crop)
//! ```
//!
//! ## Degradation policy
//!
//! [`process_upload`] is infallible by design: the caller always receives a
//! usable file reference. On success that is the web rendition plus the
//! derivative URLs (`processed = true`); on any fatal failure it is the
//! untouched original (`processed = false`, URL fields omitted). Secondary
//! renditions (dashboard, thumbnail) are best-effort: their failures are
//! logged and the upload still succeeds on the web rendition alone.
//!
//! ## Ordering guarantee
//!
//! The original is deleted only after the web derivative's bytes are fsynced
//! ([`write_synced`](crate::imaging::write_synced)) *and* re-confirmed
//! present and non-empty by a fresh stat. There is never a moment where both
//! the original and the web rendition are absent.
//!
//! ## Concurrency
//!
//! The three encodes run on their own threads against the same decoded
//! image and are joined over a channel with a per-file deadline. Workers
//! encode entirely in memory and re-check an abandon flag before the file
//! write, so a timed-out or cancelled run leaves no partial derivative.
//! Batch uploads fan the whole routine out over a rayon pool; instances
//! share nothing but the target directory.

use crate::category::Category;
use crate::config::PipelineConfig;
use crate::imaging::{
    Derivative, DerivativeProfile, Dimensions, EncodeError, EncodeJob, FitMode, ProbeError,
    ProfileKind, Quality, STOCK_PROFILES, ScaleError, ScalePlan, derivative_file_name,
    is_raster_candidate, plan_cover, plan_inside, probe, render, write_synced,
};
use image::DynamicImage;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source is not a decodable raster image.
    #[error(transparent)]
    Unreadable(#[from] ProbeError),
    /// The source has zero or corrupt geometry.
    #[error("invalid geometry in {}: {source}", .path.display())]
    InvalidDimensions {
        path: PathBuf,
        #[source]
        source: ScaleError,
    },
    /// The source path has no usable basename to derive output names from.
    #[error("source has no usable file name: {}", .0.display())]
    BadSourcePath(PathBuf),
    /// The web rendition failed; without a primary artifact the run is fatal.
    #[error("web rendition failed: {0}")]
    WebEncode(#[source] EncodeError),
    /// The web rendition did not stat as present and non-empty after encode.
    #[error("web rendition missing or empty on disk: {}", .0.display())]
    WebMissing(PathBuf),
    /// The run was abandoned by the caller's cancellation flag.
    #[error("cancelled before completion")]
    Cancelled,
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

/// The value handed back to the upload caller, serialized with camelCase
/// keys for the persistence/UI collaborators.
///
/// Two shapes: processed (web rendition path/size, all URLs present that
/// succeeded) and degraded (original path/size, `processed = false`, URL
/// fields omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub processed: bool,
    /// Final primary file path: the web rendition, or the original on failure.
    pub path: PathBuf,
    /// Bytes of the primary file, from a filesystem stat.
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One batch entry: the source file and what became of it.
#[derive(Debug)]
pub struct BatchItem {
    pub source: PathBuf,
    pub outcome: UploadOutcome,
}

/// Process one uploaded file into its three derivatives.
///
/// Never returns an error: fatal pipeline failures degrade to the original
/// file reference with `processed = false`, leaving the upload usable.
pub fn process_upload(source: &Path, category: Category, config: &PipelineConfig) -> UploadOutcome {
    let cancel = Arc::new(AtomicBool::new(false));
    process_upload_with_cancel(source, category, config, &cancel)
}

/// [`process_upload`] with a caller-owned cancellation flag. Setting the
/// flag abandons in-flight encodes and removes partially produced
/// derivative files; the original is left untouched.
pub fn process_upload_with_cancel(
    source: &Path,
    category: Category,
    config: &PipelineConfig,
    cancel: &Arc<AtomicBool>,
) -> UploadOutcome {
    match try_process_upload(source, category, config, cancel) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("{}: falling back to original: {err}", source.display());
            degraded(source)
        }
    }
}

/// The fallible pipeline, for callers that need the failure itself rather
/// than the degraded contract.
pub fn try_process_upload(
    source: &Path,
    category: Category,
    config: &PipelineConfig,
    cancel: &Arc<AtomicBool>,
) -> Result<UploadOutcome, PipelineError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PipelineError::BadSourcePath(source.to_path_buf()))?;
    let dir = source.parent().unwrap_or(Path::new("")).to_path_buf();

    let dims = probe(source)?;
    debug!("{}: {}x{}", source.display(), dims.width, dims.height);

    let profiles = configured_profiles(config);
    let plans =
        plan_derivatives(dims, &profiles).map_err(|e| PipelineError::InvalidDimensions {
            path: source.to_path_buf(),
            source: e,
        })?;

    let jobs: Vec<EncodeJob> = plans
        .iter()
        .map(|(profile, plan)| EncodeJob {
            profile: *profile,
            plan: *plan,
            output: dir.join(derivative_file_name(stem, profile)),
        })
        .collect();

    if cancel.load(Ordering::SeqCst) {
        return Err(PipelineError::Cancelled);
    }

    // Decode once; the three encodes are pure transforms of the same pixels.
    let decoded = Arc::new(decode_source(source)?);
    let timeout = Duration::from_secs(config.encoding.timeout_secs);
    let results = encode_all(&decoded, &jobs, timeout, cancel);

    // An upstream cancellation never finalizes: derivatives written before
    // the flag flipped are cleaned up and the source stays in place.
    if cancel.load(Ordering::SeqCst) {
        remove_outputs(source, &jobs);
        return Err(PipelineError::Cancelled);
    }

    finalize(source, category, &jobs, results)
}

/// Discover raster files in a directory and run the pipeline over them as
/// independent parallel instances on the global rayon pool.
pub fn process_batch(
    dir: &Path,
    category: Category,
    config: &PipelineConfig,
    recursive: bool,
) -> std::io::Result<Vec<BatchItem>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        ));
    }

    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_raster_candidate(path))
        .collect();
    files.sort();

    let cancel = Arc::new(AtomicBool::new(false));
    Ok(files
        .into_par_iter()
        .map(|path| {
            let outcome = process_upload_with_cancel(&path, category, config, &cancel);
            BatchItem {
                source: path,
                outcome,
            }
        })
        .collect())
}

/// Plan the stock profile targets for a source geometry without touching
/// any files. Backs the `probe` CLI command's preview.
pub fn plan_stock_derivatives(
    dims: Dimensions,
) -> Result<Vec<(DerivativeProfile, ScalePlan)>, ScaleError> {
    plan_derivatives(dims, &STOCK_PROFILES)
}

/// The stock profile table with config quality overrides applied. Boxes,
/// formats, and suffixes are not configurable.
fn configured_profiles(config: &PipelineConfig) -> [DerivativeProfile; 3] {
    let mut profiles = STOCK_PROFILES;
    for profile in &mut profiles {
        profile.quality = Quality::new(match profile.kind {
            ProfileKind::Web => config.encoding.web_quality,
            ProfileKind::Dashboard => config.encoding.dashboard_quality,
            ProfileKind::Thumbnail => config.encoding.thumbnail_quality,
        });
    }
    profiles
}

/// Plan all profile targets for one source.
///
/// Dashboard resampling is tied to the web decision: once the web rendition
/// shrank, the dashboard is re-resampled too, even when it already fits its
/// own box. The dashboard artifact therefore never ends up larger than the
/// freshly computed web target.
fn plan_derivatives(
    dims: Dimensions,
    profiles: &[DerivativeProfile],
) -> Result<Vec<(DerivativeProfile, ScalePlan)>, ScaleError> {
    let mut plans = Vec::with_capacity(profiles.len());
    let mut web_resized = false;
    for profile in profiles {
        let mut plan = match profile.fit {
            FitMode::Inside => plan_inside(dims, profile.bound)?,
            FitMode::Cover => plan_cover(dims, profile.bound)?,
        };
        match profile.kind {
            ProfileKind::Web => web_resized = plan.resize_required,
            ProfileKind::Dashboard => {
                plan.resize_required = plan.resize_required || web_resized;
            }
            ProfileKind::Thumbnail => {}
        }
        plans.push((*profile, plan));
    }
    Ok(plans)
}

fn decode_source(path: &Path) -> Result<DynamicImage, PipelineError> {
    let reader = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| unreadable(path, e.to_string()))?;
    reader.decode().map_err(|e| unreadable(path, e.to_string()))
}

fn unreadable(path: &Path, reason: String) -> PipelineError {
    PipelineError::Unreadable(ProbeError::Unreadable {
        path: path.display().to_string(),
        reason,
    })
}

/// Run every encode job on its own thread and join with a per-file deadline.
///
/// Jobs that miss the deadline report a timeout error and the shared flag is
/// set so their workers abandon before touching disk. Every expected profile
/// has an entry in the returned map.
fn encode_all(
    decoded: &Arc<DynamicImage>,
    jobs: &[EncodeJob],
    timeout: Duration,
    cancel: &Arc<AtomicBool>,
) -> HashMap<ProfileKind, Result<Derivative, EncodeError>> {
    // The caller's cancel flag is shared across a whole batch; the deadline
    // flag is this run's alone, so one slow file cannot abandon its
    // neighbours.
    let abandoned = Arc::new(AtomicBool::new(false));
    let expected: Vec<ProfileKind> = jobs.iter().map(|j| j.profile.kind).collect();
    let (tx, rx) = mpsc::channel();
    for job in jobs.iter().cloned() {
        let tx = tx.clone();
        let decoded = Arc::clone(decoded);
        let cancel = Arc::clone(cancel);
        let abandoned = Arc::clone(&abandoned);
        std::thread::spawn(move || {
            let kind = job.profile.kind;
            // A send failure means the join already gave up on this run.
            let _ = tx.send((kind, encode_one(&decoded, &job, &cancel, &abandoned)));
        });
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let mut results = HashMap::new();
    while results.len() < expected.len() {
        let wait = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok((kind, result)) => {
                results.insert(kind, result);
            }
            Err(RecvTimeoutError::Timeout) => {
                abandoned.store(true, Ordering::SeqCst);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    for kind in expected {
        results
            .entry(kind)
            .or_insert_with(|| Err(EncodeError::TimedOut(timeout.as_secs())));
    }
    results
}

fn encode_one(
    decoded: &DynamicImage,
    job: &EncodeJob,
    cancel: &AtomicBool,
    abandoned: &AtomicBool,
) -> Result<Derivative, EncodeError> {
    let given_up = || cancel.load(Ordering::SeqCst) || abandoned.load(Ordering::SeqCst);

    if given_up() {
        return Err(EncodeError::Cancelled);
    }
    let bytes = render(decoded, job)?;
    // The encode ran in memory. An abandoned worker stops here and never
    // leaves a file behind.
    if given_up() {
        return Err(EncodeError::Cancelled);
    }
    write_synced(&job.output, &bytes)?;
    Ok(Derivative {
        kind: job.profile.kind,
        path: job.output.clone(),
        size: bytes.len() as u64,
    })
}

/// Join point: confirm the web rendition, retire the original, publish URLs.
fn finalize(
    source: &Path,
    category: Category,
    jobs: &[EncodeJob],
    mut results: HashMap<ProfileKind, Result<Derivative, EncodeError>>,
) -> Result<UploadOutcome, PipelineError> {
    let web = match results
        .remove(&ProfileKind::Web)
        .unwrap_or(Err(EncodeError::Cancelled))
    {
        Ok(derivative) => derivative,
        Err(err) => {
            remove_outputs(source, jobs);
            return Err(match err {
                EncodeError::Cancelled => PipelineError::Cancelled,
                other => PipelineError::WebEncode(other),
            });
        }
    };

    // Fresh stat, not the encoder's byte count: deletion of the original is
    // gated on the rendition actually being on disk.
    let web_size = match std::fs::metadata(&web.path) {
        Ok(meta) if meta.len() > 0 => meta.len(),
        _ => {
            remove_outputs(source, jobs);
            return Err(PipelineError::WebMissing(web.path.clone()));
        }
    };

    let mut dashboard_url = None;
    let mut thumbnail_url = None;
    for job in jobs {
        let kind = job.profile.kind;
        match results.get(&kind) {
            Some(Ok(derivative)) => match kind {
                ProfileKind::Dashboard => {
                    dashboard_url = Some(public_url(category, &derivative.path));
                }
                ProfileKind::Thumbnail => {
                    thumbnail_url = Some(public_url(category, &derivative.path));
                }
                ProfileKind::Web => {}
            },
            Some(Err(err)) => {
                warn!(
                    "{}: {} rendition failed, continuing without it: {err}",
                    source.display(),
                    kind.name()
                );
            }
            None => {}
        }
    }

    if web.path == source {
        // A canonical-format upload whose web rendition overwrote it in
        // place. The file on disk IS the derivative now; removing it would
        // leave neither original nor primary.
        debug!("{}: replaced in place by the web rendition", source.display());
    } else {
        match std::fs::remove_file(source) {
            Ok(()) => debug!("{}: superseded source removed", source.display()),
            Err(err) => warn!(
                "{}: could not remove superseded source (derivatives are intact): {err}",
                source.display()
            ),
        }
    }

    Ok(UploadOutcome {
        processed: true,
        path: web.path.clone(),
        size: web_size,
        web_url: Some(public_url(category, &web.path)),
        dashboard_url,
        thumbnail: thumbnail_url,
    })
}

/// Best-effort removal of every derivative output for a failed run, so a
/// fatal outcome does not leak orphan files. The source is never touched,
/// including the in-place case where it shares the web output path.
fn remove_outputs(source: &Path, jobs: &[EncodeJob]) {
    for job in jobs {
        if job.output == source {
            continue;
        }
        if std::fs::remove_file(&job.output).is_ok() {
            debug!("removed orphan derivative {}", job.output.display());
        }
    }
}

fn public_url(category: Category, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", category.url_prefix(), name)
}

fn degraded(source: &Path) -> UploadOutcome {
    let size = std::fs::metadata(source).map(|m| m.len()).unwrap_or(0);
    UploadOutcome {
        processed: false,
        path: source.to_path_buf(),
        size,
        web_url: None,
        dashboard_url: None,
        thumbnail: None,
    }
}
