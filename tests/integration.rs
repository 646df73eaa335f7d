//! Integration tests for the SVG grid converter

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use svg_grid_pdf::convert::{convert, run_conversion, ConversionEvent, ConversionRequest};
use svg_grid_pdf::inputs::collect_inputs;
use svg_grid_pdf::layout::PageSize;
use svg_grid_pdf::output::OutputTarget;
use svg_grid_pdf::pdf::inspect_document;
use svg_grid_pdf::settings::GridConfig;
use svg_grid_pdf::Error;
use tempfile::TempDir;

/// Write a small valid SVG whose size varies with `i`
fn write_svg(dir: &Path, i: usize) -> PathBuf {
    let path = dir.join(format!("image_{:02}.svg", i));
    let width = 40 + i * 10;
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="60" viewBox="0 0 {w} 60">
  <rect x="2" y="2" width="{inner}" height="56" fill="#{i:02}4080" stroke="black"/>
</svg>"##,
        w = width,
        inner = width - 4,
        i = i % 100
    );
    std::fs::write(&path, svg).expect("Failed to write fixture");
    path
}

fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"<svg><g></svg").expect("Failed to write fixture");
    path
}

fn request(inputs: Vec<PathBuf>, out_dir: &Path, per_page: usize, high_quality: bool) -> ConversionRequest {
    ConversionRequest {
        inputs,
        config: GridConfig::new(per_page, PageSize::A4, high_quality).expect("valid config"),
        output: OutputTarget::new(out_dir, "converted_svgs"),
    }
}

#[test]
fn test_ten_images_make_two_pages() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let inputs: Vec<PathBuf> = (0..10).map(|i| write_svg(temp_dir.path(), i)).collect();
    let out_dir = temp_dir.path().join("out");

    let summary = convert(&request(inputs, &out_dir, 9, false)).expect("conversion failed");
    assert_eq!(summary.page_count, 2);
    assert_eq!(summary.succeeded, 10);
    assert!(!summary.has_errors());

    let info = inspect_document(&summary.output_path).expect("Failed to inspect output");
    assert_eq!(info.page_count, 2);
    assert_eq!(info.images_per_page, vec![9, 1]);
}

#[test]
fn test_non_empty_cells_per_page() {
    for count in [1usize, 8, 9, 17, 19] {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let inputs: Vec<PathBuf> = (0..count).map(|i| write_svg(temp_dir.path(), i)).collect();

        let summary = convert(&request(inputs, temp_dir.path(), 9, false)).expect("conversion failed");
        let info = inspect_document(&summary.output_path).expect("Failed to inspect output");

        assert_eq!(info.page_count, (count + 8) / 9);
        let mut remaining = count;
        for on_page in &info.images_per_page {
            assert_eq!(*on_page, remaining.min(9));
            remaining -= on_page;
        }
        assert_eq!(remaining, 0);
    }
}

#[test]
fn test_one_corrupt_file_is_skipped() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut inputs: Vec<PathBuf> = (0..5).map(|i| write_svg(temp_dir.path(), i)).collect();
    let corrupt = write_corrupt(temp_dir.path(), "broken.svg");
    inputs.insert(2, corrupt.clone());

    let mut events = Vec::new();
    let summary = run_conversion(
        &request(inputs, temp_dir.path(), 9, true),
        &mut |e| events.push(e),
        &AtomicBool::new(false),
    )
    .expect("run should succeed with a non-fatal error");

    assert_eq!(summary.total, 6);
    assert_eq!(summary.succeeded, 5);
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.failed[0].path, corrupt);

    let info = inspect_document(&summary.output_path).expect("Failed to inspect output");
    assert_eq!(info.image_count(), 5);

    let progress_events = events
        .iter()
        .filter(|e| matches!(e, ConversionEvent::Progress { .. }))
        .count();
    assert_eq!(progress_events, 6);
}

#[test]
fn test_four_valid_one_corrupt_gives_four_images() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut inputs: Vec<PathBuf> = (0..4).map(|i| write_svg(temp_dir.path(), i)).collect();
    inputs.push(write_corrupt(temp_dir.path(), "bad.svg"));

    let summary = convert(&request(inputs, temp_dir.path(), 9, false)).expect("conversion failed");
    let info = inspect_document(&summary.output_path).expect("Failed to inspect output");
    assert_eq!(info.images_per_page, vec![4]);
    assert_eq!(summary.failed_count(), 1);
}

#[test]
fn test_all_corrupt_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let inputs: Vec<PathBuf> = (0..5)
        .map(|i| write_corrupt(temp_dir.path(), &format!("bad_{}.svg", i)))
        .collect();
    let out_dir = temp_dir.path().join("out");

    let err = convert(&request(inputs, &out_dir, 9, true)).unwrap_err();
    match err {
        Error::NoValidImages { total, failed } => {
            assert_eq!(total, 5);
            assert_eq!(failed, 5);
        }
        other => panic!("expected NoValidImages, got {:?}", other),
    }
    assert!(!out_dir.exists());
}

#[test]
fn test_existing_output_gets_numbered_name() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let out_dir = temp_dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    std::fs::write(out_dir.join("converted_svgs.pdf"), b"existing").unwrap();

    let inputs = vec![write_svg(temp_dir.path(), 0)];
    let summary = convert(&request(inputs, &out_dir, 9, true)).expect("conversion failed");

    assert_eq!(summary.output_path, out_dir.join("converted_svgs (1).pdf"));
    assert_eq!(std::fs::read(out_dir.join("converted_svgs.pdf")).unwrap(), b"existing");
}

#[test]
fn test_unwritable_output_is_terminal() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let blocker = temp_dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();

    let inputs = vec![write_svg(temp_dir.path(), 0)];
    let err = convert(&request(inputs, &blocker.join("out"), 9, false)).unwrap_err();
    assert!(matches!(err, Error::OutputWrite { failed: 0, .. }));
}

#[test]
fn test_folder_input_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let src = temp_dir.path().join("drawings");
    std::fs::create_dir(&src).unwrap();
    for i in 0..3 {
        write_svg(&src, i);
    }
    std::fs::write(src.join("readme.txt"), b"ignored").unwrap();

    let inputs = collect_inputs(&[src.to_string_lossy().into_owned()]).expect("collect inputs");
    assert_eq!(inputs.len(), 3);

    let summary = convert(&request(inputs, temp_dir.path(), 2, true)).expect("conversion failed");
    let info = inspect_document(&summary.output_path).expect("Failed to inspect output");
    assert_eq!(info.images_per_page, vec![2, 1]);
    assert_eq!(info.title.as_deref(), Some("converted_svgs"));
}
