//! Integration tests for the partition boundary.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ragpack::error::{Error, Result};
use ragpack::model::{Element, ElementType};
use ragpack::partition::{
    process_bytes, process_file, FileKind, PartitionParams, Partitioner, PartitionerRegistry,
    ProcessOptions, ProcessReport, Strategy,
};

/// Mock partitioner that records the parameters it receives.
struct MockPartitioner {
    extensions: Vec<&'static str>,
    name: &'static str,
    fail_tuned: bool,
    calls: AtomicUsize,
    last_strategy: std::sync::Mutex<Option<Strategy>>,
}

impl MockPartitioner {
    fn new(extensions: Vec<&'static str>, name: &'static str) -> Self {
        Self {
            extensions,
            name,
            fail_tuned: false,
            calls: AtomicUsize::new(0),
            last_strategy: std::sync::Mutex::new(None),
        }
    }

    fn failing_tuned(mut self) -> Self {
        self.fail_tuned = true;
        self
    }
}

impl Partitioner for MockPartitioner {
    fn supported_extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn name(&self) -> &str {
        self.name
    }

    fn partition(&self, path: &Path, params: &PartitionParams) -> Result<Vec<Element>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_strategy.lock().unwrap() = Some(params.strategy);

        if !path.exists() {
            return Err(Error::Partition("scratch file missing".into()));
        }
        if self.fail_tuned && params.extract_image_block_to_payload {
            return Err(Error::Partition("tuned parameters rejected".into()));
        }

        Ok(vec![
            Element::title("Scanned page"),
            Element::image("Photo", "aGVsbG8=", "image/jpeg").with_page(1),
            Element::new(ElementType::Figure, "Diagram"),
        ])
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_registry_register_and_lookup() {
    init_logger();
    let mut registry = PartitionerRegistry::new();
    registry.register(Arc::new(MockPartitioner::new(vec!["png", "jpg"], "images")));

    assert!(registry.supports("PNG"));
    assert!(registry.supports("jpg"));
    assert!(!registry.supports("pdf"));
    assert_eq!(registry.supported_extensions(), vec!["jpg", "png"]);
    assert_eq!(registry.get_by_name("IMAGES").unwrap().name(), "images");
}

#[test]
fn test_image_upload_uses_hi_res() {
    let mock = Arc::new(MockPartitioner::new(vec!["png"], "images"));
    let mut registry = PartitionerRegistry::new();
    registry.register(mock.clone());

    let options = ProcessOptions::new().with_strategy(Strategy::Fast);
    let report = process_bytes(&registry, b"\x89PNG\r\n\x1a\n", "scan.png", &options);

    assert!(report.is_success());
    assert_eq!(report.method(), "image_hi_res");
    assert_eq!(*mock.last_strategy.lock().unwrap(), Some(Strategy::HiRes));
    match report {
        ProcessReport::Success {
            element_count,
            image_elements,
            images_with_payload,
            image_support,
            ..
        } => {
            assert_eq!(element_count, 3);
            assert_eq!(image_elements, 2);
            assert_eq!(images_with_payload, 1);
            assert!(image_support);
        }
        ProcessReport::Failure { error, .. } => panic!("unexpected failure: {}", error),
    }
}

#[test]
fn test_tuned_failure_falls_back_to_generic() {
    let mock = Arc::new(MockPartitioner::new(vec!["pdf"], "pdf").failing_tuned());
    let mut registry = PartitionerRegistry::new();
    registry.register(mock.clone());

    let report = process_bytes(&registry, b"%PDF-1.7\n", "report.pdf", &ProcessOptions::default());

    assert!(report.is_success());
    assert_eq!(report.method(), "local");
    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_missing_file_reports_error() {
    let mut registry = PartitionerRegistry::new();
    registry.register(Arc::new(MockPartitioner::new(vec!["docx"], "office")));

    let report = process_file(&registry, "/nonexistent/report.docx", &ProcessOptions::default());

    assert_eq!(report.status(), "error");
    assert!(report.elements().is_none());
    assert_eq!(report.element_count(), 0);
    assert!(report.processing_time() >= 0.0);
}

#[test]
fn test_scratch_file_removed_after_processing() {
    struct PathRecorder(std::sync::Mutex<Option<std::path::PathBuf>>);

    impl Partitioner for PathRecorder {
        fn supported_extensions(&self) -> &[&str] {
            &["xlsx"]
        }
        fn name(&self) -> &str {
            "recorder"
        }
        fn partition(&self, path: &Path, _params: &PartitionParams) -> Result<Vec<Element>> {
            *self.0.lock().unwrap() = Some(path.to_path_buf());
            Err(Error::Partition("boom".into()))
        }
    }

    let recorder = Arc::new(PathRecorder(std::sync::Mutex::new(None)));
    let mut registry = PartitionerRegistry::new();
    registry.register(recorder.clone());

    let report = process_bytes(&registry, b"PK\x03\x04", "book.xlsx", &ProcessOptions::default());
    assert!(!report.is_success());

    let path = recorder.0.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_kind_detection_matches_params() {
    let options = ProcessOptions::default();
    let params = PartitionParams::for_kind(FileKind::from_extension("pptx"), &options);
    assert!(params.include_slide_notes);

    let params = PartitionParams::for_kind(FileKind::from_extension("txt"), &options);
    assert_eq!(params, PartitionParams::generic(&options));
}
