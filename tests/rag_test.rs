//! Integration tests for RAG export, vision descriptions and the
//! clean/chunk pipeline feeding it.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ragpack::chunk::{chunk_elements, ChunkOptions, ChunkStrategy};
use ragpack::clean::{clean_elements, CleanOptions};
use ragpack::error::Result;
use ragpack::model::{Element, ElementType};
use ragpack::render::{to_rag, RagExporter, RagGrouping, RagOptions};
use ragpack::vision::{
    CancelToken, ImageDescriber, ImageDescription, VisionClient, VisionProvider, FALLBACK_MODEL,
};

struct SlowDescriber(Duration);

impl ImageDescriber for SlowDescriber {
    fn name(&self) -> &str {
        "slow"
    }

    fn describe(&self, _image_base64: &str, _mime_type: &str) -> Result<ImageDescription> {
        thread::sleep(self.0);
        Ok(ImageDescription {
            description: "Too late".to_string(),
            model: "slow-model".to_string(),
            cost_estimate: 1.0,
            cached: false,
            error: None,
        })
    }
}

fn image_elements() -> Vec<Element> {
    vec![
        Element::title("Slides").with_page(1),
        Element::image("Diagram", "aGVsbG8=", "image/png").with_page(1),
    ]
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_payload_never_in_content() {
    init_logger();
    let payloads = ["aGVsbG8=", "d29ybGQ=", &"QUJD".repeat(400)];
    let mut elements = Vec::new();
    for (i, payload) in payloads.iter().enumerate() {
        elements.push(Element::image(format!("Figure {}", i), *payload, "image/png"));
        // A caption that repeats the payload verbatim
        let mut picture = Element::image(*payload, *payload, "image/gif");
        picture.element_type = ElementType::Picture;
        elements.push(picture);
    }

    for grouping in [RagGrouping::Element, RagGrouping::Page] {
        let export = to_rag(&elements, &RagOptions::new("deck.pptx").with_grouping(grouping)).unwrap();
        for document in &export.documents {
            for payload in payloads {
                assert!(!document.content.contains(payload), "payload leaked in {:?}", grouping);
            }
        }
        for payload in payloads {
            assert!(!export.json_lines.contains(payload));
        }
    }
}

#[test]
fn test_slow_vision_times_out_to_placeholder() {
    let vision = VisionClient::new(
        Arc::new(SlowDescriber(Duration::from_secs(5))),
        Duration::from_millis(100),
    );
    let exporter = RagExporter::new(RagOptions::new("deck.pptx").with_image_descriptions(true))
        .with_vision(vision);

    let started = Instant::now();
    let export = exporter.export(&image_elements()).unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));

    let image_doc = &export.documents[1];
    assert_eq!(image_doc.attribute("image_described"), Some(&serde_json::json!(false)));
    assert_eq!(image_doc.attribute("vision_model"), Some(&serde_json::json!(FALLBACK_MODEL)));
    assert!(image_doc
        .attribute("vision_error")
        .and_then(|v| v.as_str())
        .unwrap()
        .contains("timed out"));

    let stats = export.image_descriptions.unwrap();
    assert_eq!(stats.total_images, 1);
    assert_eq!(stats.images_failed, 1);
}

#[test]
fn test_cancelled_vision_returns_immediately() {
    let cancel = CancelToken::new();
    let vision = VisionClient::new(
        Arc::new(SlowDescriber(Duration::from_secs(5))),
        Duration::from_secs(30),
    )
    .with_cancel(cancel.clone());

    cancel.cancel();
    let started = Instant::now();
    let description = vision.describe("aGVsbG8=", "image/png");

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(description.is_placeholder());
    assert_eq!(description.description, "Image element (type: image/png)");
}

#[test]
fn test_provider_resolution_order() {
    let lookup = |keys: &'static [&'static str]| {
        move |name: &str| keys.iter().any(|k| *k == name).then(|| "key".to_string())
    };

    assert_eq!(
        VisionProvider::Auto.resolve_with(lookup(&["OPENAI_API_KEY", "ANTHROPIC_API_KEY"])),
        VisionProvider::Claude
    );
    assert_eq!(
        VisionProvider::Auto.resolve_with(lookup(&["GOOGLE_API_KEY", "OPENAI_API_KEY"])),
        VisionProvider::Gpt4
    );
    assert_eq!(
        VisionProvider::Auto.resolve_with(lookup(&[])),
        VisionProvider::Local
    );
    assert_eq!(
        VisionProvider::Claude.resolve_with(lookup(&[])),
        VisionProvider::Claude
    );
}

#[test]
fn test_clean_chunk_then_export() {
    let elements = vec![
        Element::title("Intro\u{a0}\u{a0}").with_page(1),
        Element::narrative("The quick brown fox\njumps over the lazy dog\nand keeps on running.").with_page(1),
        Element::narrative("   ").with_page(1),
        Element::title("Details").with_page(2),
        Element::narrative("x".repeat(2500)).with_page(2),
    ];

    let cleaned = clean_elements(&elements, &CleanOptions::default().with_drop_empty(true));
    assert_eq!(cleaned.cleaned_count, 4);
    assert_eq!(
        cleaned.elements[1].text,
        "The quick brown fox jumps over the lazy dog and keeps on running."
    );

    let options = ChunkOptions::new().with_strategy(ChunkStrategy::ByTitle);
    let chunked = chunk_elements(&cleaned.elements, &options).unwrap();
    assert!(chunked.chunks.iter().all(|c| c.len() <= options.max_characters));
    assert_eq!(chunked.chunk_count, chunked.chunks.len());
    // Intro section, then the split Details section
    assert!(chunked.chunks[0].text.starts_with("Intro"));
    assert!(chunked.chunks.iter().skip(1).any(|c| c.is_continuation));

    let chunk_elements: Vec<Element> = chunked.chunks.iter().map(|c| c.to_element()).collect();
    let export = to_rag(&chunk_elements, &RagOptions::new("notes.docx")).unwrap();
    assert_eq!(export.document_count, chunk_elements.len());
    assert_eq!(export.recommended_chunking.strategy, "semantic");
}
