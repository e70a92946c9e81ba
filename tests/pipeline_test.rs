//! Aggregation, error modes and persistence across strategies.

mod common;

use common::{write_blank_pdf, FixedOcr, FlakyDetector, WhitePages};
use pdf2data::{
    BoundingBox, Detection, DetectionExtractor, Error, ErrorMode, ExtractOptions, NativeExtractor,
    PageExtractor, PageResult, Pipeline, PdfSource, Result,
};

fn flaky_extractor(fail_on: Vec<usize>, rasterizer: WhitePages) -> DetectionExtractor {
    let detector = FlakyDetector {
        fail_on,
        page: 0,
        detections: vec![Detection::new(
            BoundingBox::new(0.0, 0.0, 20.0, 10.0),
            0,
            "text",
            0.9,
        )],
    };
    DetectionExtractor::new(
        Box::new(rasterizer),
        Box::new(detector),
        Box::new(FixedOcr(vec!["ok"])),
    )
}

#[test]
fn test_one_entry_per_page_in_order() {
    let dir = tempfile::tempdir().unwrap();
    for pages in [1usize, 3, 7] {
        let path = dir.path().join(format!("doc{}.pdf", pages));
        write_blank_pdf(&path, pages);

        let result = Pipeline::default()
            .run(&mut NativeExtractor::new(), &path)
            .unwrap();
        assert_eq!(result.page_count(), pages);
        let indices: Vec<usize> = result.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, (0..pages).collect::<Vec<_>>());
    }
}

#[test]
fn test_lenient_mode_degrades_failed_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flaky.pdf");
    write_blank_pdf(&path, 3);

    let mut extractor = flaky_extractor(vec![1], WhitePages::new(50, 50));
    let result = Pipeline::default().run(&mut extractor, &path).unwrap();

    assert_eq!(result.page_count(), 3);
    assert_eq!(result.pages[0].text, "ok");
    assert!(result.pages[1].is_empty());
    assert_eq!(result.pages[1].index, 1);
    assert_eq!(result.pages[2].text, "ok");
}

#[test]
fn test_strict_mode_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flaky.pdf");
    write_blank_pdf(&path, 3);

    let mut extractor = flaky_extractor(vec![1], WhitePages::new(50, 50));
    let options = ExtractOptions::new().with_error_mode(ErrorMode::Strict);
    let err = Pipeline::new(options).run(&mut extractor, &path).unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
}

struct Unavailable;

impl PageExtractor for Unavailable {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn extract_page(&mut self, _: &PdfSource, _: usize, _: &ExtractOptions) -> Result<PageResult> {
        Err(Error::EngineUnavailable("pdftoppm not found".into()))
    }
}

#[test]
fn test_fatal_errors_abort_even_when_lenient() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    write_blank_pdf(&path, 2);

    let err = Pipeline::default().run(&mut Unavailable, &path).unwrap_err();
    assert!(matches!(err, Error::EngineUnavailable(_)));
}

#[test]
fn test_missing_source() {
    let err = Pipeline::default()
        .run(&mut NativeExtractor::new(), "/no/such/input.pdf")
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
}

#[test]
fn test_output_dir_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    write_blank_pdf(&path, 1);
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a dir").unwrap();

    let options = ExtractOptions::new().save_images_to(blocker.join("images"));
    let err = Pipeline::new(options)
        .run(&mut NativeExtractor::new(), &path)
        .unwrap_err();
    assert!(matches!(err, Error::OutputDir { .. }));
}

#[test]
fn test_progress_callback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    write_blank_pdf(&path, 4);

    let mut seen = Vec::new();
    Pipeline::default()
        .run_with_progress(&mut NativeExtractor::new(), &path, |done, total| {
            seen.push((done, total))
        })
        .unwrap();
    assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

#[test]
fn test_json_skips_image_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    write_blank_pdf(&path, 1);

    let mut extractor = flaky_extractor(Vec::new(), WhitePages::new(50, 50));
    let result = Pipeline::default().run(&mut extractor, &path).unwrap();
    let json = result.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["strategy"], "detect");
    assert_eq!(value["pages"][0]["text"], "ok");
    assert_eq!(value["pages"][0]["images"][0]["format"], "jpeg");
    assert!(value["pages"][0]["images"][0].get("data").is_none());
}
