//! End-to-end pipeline tests: real encodes against synthetic images in
//! temporary directories.

use imgpress::config::PipelineConfig;
use imgpress::pipeline::{process_batch, process_upload, process_upload_with_cancel};
use imgpress::Category;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    use image::ImageEncoder;
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, 64, (y % 256) as u8])
    });
    img.save(path).unwrap();
}

fn create_test_webp(path: &Path, width: u32, height: u32) {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 80, 40]),
    ));
    let encoder = webp::Encoder::from_image(&img).unwrap();
    std::fs::write(path, &*encoder.encode(75.0)).unwrap();
}

fn dimensions_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn large_jpeg_produces_all_three_renditions_and_retires_source() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("photo.jpg");
    create_test_jpeg(&source, 2000, 1500);

    let outcome = process_upload(&source, Category::Projects, &PipelineConfig::default());

    assert!(outcome.processed);

    let web = tmp.path().join("photo.webp");
    let dashboard = tmp.path().join("photo_dashboard.webp");
    let thumb = tmp.path().join("photo_thumb.jpg");

    // Inside fit: 2000x1500 into 1920x1920 scales by 0.96.
    assert_eq!(dimensions_of(&web), (1920, 1440));
    assert_eq!(dimensions_of(&dashboard), (800, 600));
    // Cover fit: always the exact box.
    assert_eq!(dimensions_of(&thumb), (300, 300));

    // The original is superseded once the web rendition is confirmed.
    assert!(!source.exists());

    assert_eq!(outcome.path, web);
    assert_eq!(outcome.size, std::fs::metadata(&web).unwrap().len());
    assert!(outcome.size > 0);
    assert_eq!(outcome.web_url.as_deref(), Some("/uploads/projects/photo.webp"));
    assert_eq!(
        outcome.dashboard_url.as_deref(),
        Some("/uploads/projects/photo_dashboard.webp")
    );
    assert_eq!(
        outcome.thumbnail.as_deref(),
        Some("/uploads/projects/photo_thumb.jpg")
    );
}

#[test]
fn small_png_keeps_dimensions_and_crops_thumbnail() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("icon.png");
    create_test_png(&source, 200, 200);

    let outcome = process_upload(&source, Category::Blog, &PipelineConfig::default());

    assert!(outcome.processed);

    // Inside fit never upscales: both WebP renditions keep 200x200.
    assert_eq!(dimensions_of(&tmp.path().join("icon.webp")), (200, 200));
    assert_eq!(dimensions_of(&tmp.path().join("icon_dashboard.webp")), (200, 200));
    // Cover fit enlarges to fill the fixed box.
    assert_eq!(dimensions_of(&tmp.path().join("icon_thumb.jpg")), (300, 300));

    // Transcode happened, so the .png original is retired.
    assert!(!source.exists());
    assert_eq!(outcome.web_url.as_deref(), Some("/uploads/blog/icon.webp"));
}

#[test]
fn corrupt_file_degrades_without_touching_anything() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("upload.jpg");
    std::fs::write(&source, b"<html>definitely not an image</html>").unwrap();

    let outcome = process_upload(&source, Category::General, &PipelineConfig::default());

    assert!(!outcome.processed);
    assert_eq!(outcome.path, source);
    assert!(outcome.web_url.is_none());

    // The corrupted upload stays exactly where it was, and nothing else
    // appeared next to it.
    assert_eq!(
        std::fs::read(&source).unwrap(),
        b"<html>definitely not an image</html>"
    );
    let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn webp_source_is_replaced_in_place_not_deleted() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("banner.webp");
    create_test_webp(&source, 160, 120);

    let outcome = process_upload(&source, Category::Banners, &PipelineConfig::default());

    assert!(outcome.processed);
    // The web rendition path IS the source path; the file must survive.
    assert_eq!(outcome.path, source);
    assert!(source.exists());
    assert_eq!(dimensions_of(&source), (160, 120));
    assert_eq!(
        outcome.web_url.as_deref(),
        Some("/uploads/banners/banner.webp")
    );
    assert_eq!(
        dimensions_of(&tmp.path().join("banner_thumb.jpg")),
        (300, 300)
    );
}

#[test]
fn rerun_overwrites_derivatives_with_identical_dimensions() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("photo.jpg");

    create_test_jpeg(&source, 1000, 800);
    let first = process_upload(&source, Category::General, &PipelineConfig::default());
    assert!(first.processed);
    let first_dims = (
        dimensions_of(&tmp.path().join("photo.webp")),
        dimensions_of(&tmp.path().join("photo_dashboard.webp")),
        dimensions_of(&tmp.path().join("photo_thumb.jpg")),
    );

    // Same upload arrives again under the same basename.
    create_test_jpeg(&source, 1000, 800);
    let second = process_upload(&source, Category::General, &PipelineConfig::default());
    assert!(second.processed);
    let second_dims = (
        dimensions_of(&tmp.path().join("photo.webp")),
        dimensions_of(&tmp.path().join("photo_dashboard.webp")),
        dimensions_of(&tmp.path().join("photo_thumb.jpg")),
    );

    assert_eq!(first_dims, second_dims);
    assert_eq!(first_dims.0, (1000, 800));
    assert_eq!(first_dims.2, (300, 300));
}

#[test]
fn cancelled_run_leaves_source_and_no_derivatives() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("photo.jpg");
    create_test_jpeg(&source, 640, 480);

    let cancel = Arc::new(AtomicBool::new(true));
    let outcome = process_upload_with_cancel(
        &source,
        Category::General,
        &PipelineConfig::default(),
        &cancel,
    );

    assert!(!outcome.processed);
    assert!(source.exists());
    assert!(!tmp.path().join("photo.webp").exists());
    assert!(!tmp.path().join("photo_dashboard.webp").exists());
    assert!(!tmp.path().join("photo_thumb.jpg").exists());
}

#[test]
fn batch_runs_each_raster_file_and_skips_the_rest() {
    let tmp = TempDir::new().unwrap();
    create_test_jpeg(&tmp.path().join("a.jpg"), 640, 480);
    create_test_png(&tmp.path().join("b.png"), 120, 90);
    std::fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();

    let nested = tmp.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    create_test_jpeg(&nested.join("c.jpg"), 64, 48);

    let items = process_batch(
        tmp.path(),
        Category::General,
        &PipelineConfig::default(),
        false,
    )
    .unwrap();

    // Two rasters at the top level; the text file and the nested directory
    // are ignored without --recursive.
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.outcome.processed));
    assert!(tmp.path().join("a.webp").exists());
    assert!(tmp.path().join("b_thumb.jpg").exists());
    assert!(nested.join("c.jpg").exists());
    assert!(!nested.join("c.webp").exists());
}

#[test]
fn batch_recursive_descends_into_subdirectories() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    create_test_jpeg(&nested.join("c.jpg"), 64, 48);

    let items = process_batch(
        tmp.path(),
        Category::General,
        &PipelineConfig::default(),
        true,
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    assert!(items[0].outcome.processed);
    assert!(nested.join("c.webp").exists());
    assert!(!nested.join("c.jpg").exists());
}

#[test]
fn batch_on_missing_directory_errors() {
    assert!(
        process_batch(
            Path::new("/nonexistent/uploads"),
            Category::General,
            &PipelineConfig::default(),
            false,
        )
        .is_err()
    );
}
