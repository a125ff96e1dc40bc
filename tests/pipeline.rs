//! Integration tests for the ingest pipeline through the public API.
//!
//! Documents are rendered by [`common::MockDocumentDecoder`] so these tests
//! never need the pdfium shared library. See `e2e.rs` for the real engine.

mod common;

use common::{
    jpeg_bytes, png_bytes, with_exif_orientation, zip64_bytes, zip_bytes, MockDocumentDecoder,
    PassthroughHeic,
};
use futures::StreamExt;
use pageflip_ingest::{
    ingest, ingest_paths, ingest_stream, CancelToken, Decoders, IngestError,
    IngestProgressCallback, OrientationClass, PipelineConfig, Progress, RunStatus, Source,
    SourceErrorKind,
};
use std::sync::{Arc, Mutex};

fn config_with_pages(pages: usize) -> PipelineConfig {
    PipelineConfig::builder()
        .decoders(
            Decoders::default()
                .with_document(Arc::new(MockDocumentDecoder::letter(pages)))
                .with_heic(Arc::new(PassthroughHeic)),
        )
        .build()
        .unwrap()
}

fn names(output: &pageflip_ingest::RunOutput) -> Vec<&str> {
    output
        .artifacts
        .iter()
        .map(|a| a.source_name.as_str())
        .collect()
}

fn decoded_size(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn sources_are_sequenced_in_natural_order() {
    let sources = vec![
        Source::new("p10.jpg", jpeg_bytes(40, 30)),
        Source::new("p2.jpg", jpeg_bytes(40, 30)),
        Source::new("p1.jpg", jpeg_bytes(40, 30)),
    ];
    let output = ingest(sources, &config_with_pages(1)).await.unwrap();

    assert_eq!(names(&output), vec!["p1.jpg", "p2.jpg", "p10.jpg"]);
    let indices: Vec<usize> = output.artifacts.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn exif_rotation_swaps_dimensions() {
    let sources = vec![Source::new("sideways.jpg", with_exif_orientation(&jpeg_bytes(800, 600), 6))];
    let output = ingest(sources, &config_with_pages(1)).await.unwrap();

    let page = &output.artifacts[0];
    assert_eq!((page.width, page.height), (600, 800));
    assert_eq!(decoded_size(&page.full_bytes), (600, 800));
    assert_eq!(page.orientation_class, OrientationClass::Portrait);
}

#[tokio::test]
async fn small_images_are_never_upscaled() {
    let output = ingest(vec![Source::new("tiny.png", png_bytes(120, 90))], &config_with_pages(1))
        .await
        .unwrap();
    let page = &output.artifacts[0];
    assert_eq!((page.width, page.height), (120, 90));
}

#[tokio::test]
async fn wide_images_are_capped_and_thumbnailed() {
    let output = ingest(vec![Source::new("wide.jpg", jpeg_bytes(3200, 1600))], &config_with_pages(1))
        .await
        .unwrap();
    let page = &output.artifacts[0];
    assert_eq!((page.width, page.height), (1600, 800));
    assert_eq!(page.orientation_class, OrientationClass::Landscape);

    let (tw, th) = decoded_size(&page.thumb_bytes);
    assert_eq!((tw, th), (300, 150));
}

#[tokio::test]
async fn thumbnail_keeps_aspect_ratio_within_one_pixel() {
    let output = ingest(vec![Source::new("odd.jpg", jpeg_bytes(1000, 777))], &config_with_pages(1))
        .await
        .unwrap();
    let page = &output.artifacts[0];
    let (tw, th) = decoded_size(&page.thumb_bytes);
    assert!(tw <= 300);
    let expected = (tw as f64 * page.height as f64 / page.width as f64).round() as i64;
    assert!((th as i64 - expected).abs() <= 1, "thumb {tw}x{th}");
}

#[tokio::test]
async fn archives_contribute_only_supported_entries() {
    let a = jpeg_bytes(40, 30);
    let c = jpeg_bytes(30, 40);
    let archive = zip_bytes(&[
        ("a.jpg", Some(a.as_slice())),
        ("b.txt", Some(b"notes".as_slice())),
        ("c.heic", Some(c.as_slice())),
        ("d/", None),
    ]);
    let output = ingest(vec![Source::new("album.zip", archive)], &config_with_pages(1))
        .await
        .unwrap();

    assert!(output.is_success());
    assert_eq!(names(&output), vec!["a.jpg", "c.heic"]);
}

#[tokio::test]
async fn lying_archive_header_fails_only_that_archive() {
    let sources = vec![
        Source::new("evil.zip", zip64_bytes("a.jpg", b"hello", 1 << 62)),
        Source::new("p1.jpg", jpeg_bytes(40, 30)),
    ];
    let output = ingest(sources, &config_with_pages(1)).await.unwrap();

    assert_eq!(names(&output), vec!["p1.jpg"]);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].source_name, "evil.zip");
    assert_eq!(output.failures[0].error.kind(), SourceErrorKind::Decode);
    assert_eq!(output.status(), RunStatus::Failed);
}

#[tokio::test]
async fn document_pages_are_consecutive() {
    let sources = vec![
        Source::new("a.jpg", jpeg_bytes(40, 30)),
        Source::new("b.pdf", b"%PDF-1.7".to_vec()),
        Source::new("c.jpg", jpeg_bytes(40, 30)),
    ];
    let output = ingest(sources, &config_with_pages(3)).await.unwrap();

    assert_eq!(output.artifacts.len(), 5);
    let pages: Vec<(usize, &str, Option<usize>)> = output
        .artifacts
        .iter()
        .map(|a| (a.index, a.source_name.as_str(), a.page_in_source))
        .collect();
    assert_eq!(
        pages,
        vec![
            (0, "a.jpg", None),
            (1, "b.pdf", Some(1)),
            (2, "b.pdf", Some(2)),
            (3, "b.pdf", Some(3)),
            (4, "c.jpg", None),
        ]
    );
    for page in &output.artifacts[1..4] {
        assert_eq!((page.width, page.height), (1600, 2071));
    }
}

#[tokio::test]
async fn document_pages_keep_their_order() {
    let output = ingest(vec![Source::new("doc.pdf", b"%PDF".to_vec())], &config_with_pages(3))
        .await
        .unwrap();
    for (i, page) in output.artifacts.iter().enumerate() {
        let img = image::load_from_memory(&page.full_bytes).unwrap().to_rgb8();
        let shade = img.get_pixel(800, 1000)[0] as i32;
        assert!((shade - MockDocumentDecoder::shade(i) as i32).abs() <= 4, "page {i}: {shade}");
    }
}

#[tokio::test]
async fn one_corrupt_source_fails_the_run_but_keeps_the_rest() {
    let sources = vec![
        Source::new("1.jpg", jpeg_bytes(40, 30)),
        Source::new("2.pdf", b"corrupt".to_vec()),
        Source::new("3.jpg", jpeg_bytes(40, 30)),
    ];
    let output = ingest(sources, &config_with_pages(2)).await.unwrap();

    assert_eq!(names(&output), vec!["1.jpg", "3.jpg"]);
    assert_eq!(output.artifacts[1].index, 1);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].source_name, "2.pdf");
    assert_eq!(output.failures[0].error.kind(), SourceErrorKind::Decode);
    assert_eq!(output.status(), RunStatus::Failed);
    assert_eq!(output.stats.decode_failures, 1);

    let err = output.into_result().unwrap_err();
    assert!(matches!(err, IngestError::PartialFailure { succeeded: 2, failed: 1 }));
}

#[tokio::test]
async fn orientation_class_uses_the_ratio_threshold() {
    let sources = vec![
        Source::new("a.png", png_bytes(140, 100)),
        Source::new("b.png", png_bytes(139, 100)),
        Source::new("c.png", png_bytes(100, 100)),
    ];
    let output = ingest(sources, &config_with_pages(1)).await.unwrap();
    let classes: Vec<OrientationClass> = output
        .artifacts
        .iter()
        .map(|a| a.orientation_class)
        .collect();
    assert_eq!(
        classes,
        vec![
            OrientationClass::Landscape,
            OrientationClass::Portrait,
            OrientationClass::Portrait,
        ]
    );
    assert_eq!(output.stats.landscape_artifacts, 1);
}

#[tokio::test]
async fn empty_input_is_fatal() {
    let err = ingest(vec![], &config_with_pages(1)).await.unwrap_err();
    assert!(matches!(err, IngestError::NoInputs));
}

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<Progress>>,
    errors: Mutex<Vec<String>>,
    started: Mutex<Option<usize>>,
    cancel_after_first: Option<CancelToken>,
}

impl IngestProgressCallback for Recorder {
    fn on_run_start(&self, total_sources: usize) {
        *self.started.lock().unwrap() = Some(total_sources);
    }

    fn on_artifact_complete(&self, _index: usize, progress: Progress) {
        self.progress.lock().unwrap().push(progress);
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
    }

    fn on_source_error(&self, name: &str, _error: &str) {
        self.errors.lock().unwrap().push(name.to_string());
    }
}

#[tokio::test]
async fn progress_total_follows_document_and_failure() {
    let recorder = Arc::new(Recorder::default());
    let config = PipelineConfig::builder()
        .decoders(Decoders::default().with_document(Arc::new(MockDocumentDecoder::letter(4))))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let sources = vec![
        Source::new("1.jpg", jpeg_bytes(40, 30)),
        Source::new("2.pdf", b"%PDF".to_vec()),
        Source::new("3.bmp", b"BM".to_vec()),
        Source::new("4.jpg", jpeg_bytes(40, 30)),
    ];
    ingest(sources, &config).await.unwrap();

    assert_eq!(*recorder.started.lock().unwrap(), Some(4));
    assert_eq!(*recorder.errors.lock().unwrap(), vec!["3.bmp"]);
    let progress = recorder.progress.lock().unwrap();
    assert_eq!(progress.len(), 6);
    assert_eq!(progress[0], Progress { completed: 1, total_expected: 4 });
    assert_eq!(progress[1], Progress { completed: 2, total_expected: 7 });
    assert_eq!(progress[5], Progress { completed: 6, total_expected: 6 });
    assert_eq!(progress[5].fraction(), 1.0);
}

#[tokio::test]
async fn cancellation_stops_between_sources() {
    let token = CancelToken::new();
    let recorder = Arc::new(Recorder {
        cancel_after_first: Some(token.clone()),
        ..Default::default()
    });
    let config = PipelineConfig::builder()
        .progress_callback(recorder.clone())
        .cancel_token(token)
        .build()
        .unwrap();
    let sources = vec![
        Source::new("1.jpg", jpeg_bytes(40, 30)),
        Source::new("2.jpg", jpeg_bytes(40, 30)),
        Source::new("3.jpg", jpeg_bytes(40, 30)),
    ];
    let output = ingest(sources, &config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.stats.skipped_sources, 2);
    assert_eq!(output.status(), RunStatus::Cancelled);
    assert!(matches!(
        output.into_result(),
        Err(IngestError::Cancelled { completed: 1 })
    ));
}

#[tokio::test]
async fn stream_matches_batch_order() {
    let sources = || {
        vec![
            Source::new("b.pdf", b"%PDF".to_vec()),
            Source::new("a.jpg", jpeg_bytes(40, 30)),
        ]
    };
    let config = config_with_pages(2);
    let batch = ingest(sources(), &config).await.unwrap();
    let streamed: Vec<_> = ingest_stream(sources(), &config)
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    let batch_order: Vec<(usize, &str)> = batch
        .artifacts
        .iter()
        .map(|a| (a.index, a.source_name.as_str()))
        .collect();
    let stream_order: Vec<(usize, &str)> = streamed
        .iter()
        .map(|a| (a.index, a.source_name.as_str()))
        .collect();
    assert_eq!(batch_order, stream_order);
}

#[tokio::test]
async fn desktop_folder_with_os_metadata_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("p1.jpg"), jpeg_bytes(40, 30)).unwrap();
    std::fs::write(dir.path().join("p2.png"), png_bytes(30, 40)).unwrap();
    std::fs::write(dir.path().join(".DS_Store"), b"\0\0\0\x01Bud1").unwrap();
    std::fs::write(dir.path().join("Thumbs.db"), b"junk").unwrap();

    let output = ingest_paths(&[dir.path()], &config_with_pages(1))
        .await
        .unwrap();

    assert!(output.is_success(), "failures: {:?}", output.failures);
    assert_eq!(names(&output), vec!["p1.jpg", "p2.png"]);
}
