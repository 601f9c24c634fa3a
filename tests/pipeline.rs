//! End-to-end pipeline runs against an in-memory store and generator.

use std::cell::{Cell, RefCell};
use std::io::Cursor;

use indexmap::IndexMap;

use deckfill::models::common::{Dimension, Size, Unit};
use deckfill::models::text::{TextContent, TextElement, TextElementKind, TextRun};
use deckfill::models::{Document, Page, PageElement, PageElementKind, Shape};
use deckfill::orchestrator::Pipeline;
use deckfill::plan::RunParams;
use deckfill::store::{AssetRef, MutateOp, PresentationStore};
use deckfill::{
    ContentGenerator, FillError, GeneratedText, GenerationContext, PlaceholderMapping, Theme,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory store that applies text replacements and deletions to its
/// document, so the styling stage's re-read reflects earlier mutations.
struct FakeStore {
    document: RefCell<Document>,
    mutations: RefCell<Vec<MutateOp>>,
    uploaded: RefCell<Vec<Vec<u8>>>,
    fail_read: bool,
}

impl FakeStore {
    fn new(document: Document) -> Self {
        FakeStore {
            document: RefCell::new(document),
            mutations: RefCell::new(Vec::new()),
            uploaded: RefCell::new(Vec::new()),
            fail_read: false,
        }
    }

    fn apply(&self, op: &MutateOp) {
        let mut document = self.document.borrow_mut();
        let Some(slides) = document.slides.as_mut() else {
            return;
        };
        match op {
            MutateOp::ReplaceAllText {
                find,
                replace,
                page_object_ids,
            } => {
                for slide in slides
                    .iter_mut()
                    .filter(|s| page_object_ids.contains(&s.object_id))
                {
                    let Some(elements) = slide.page_elements.as_mut() else {
                        continue;
                    };
                    for element in elements {
                        if let PageElementKind::Shape(shape) = &mut element.element_kind {
                            if let Some(text) = shape.text.as_mut() {
                                if let Some(parts) = text.text_elements.as_mut() {
                                    for part in parts {
                                        if let Some(TextElementKind::TextRun(run)) = &mut part.kind
                                        {
                                            if let Some(content) = run.content.as_mut() {
                                                *content = content.replace(find, replace);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            MutateOp::DeleteElement { object_id } => {
                for slide in slides.iter_mut() {
                    if let Some(elements) = slide.page_elements.as_mut() {
                        elements.retain(|e| &e.object_id != object_id);
                    }
                }
            }
            _ => {}
        }
    }

    fn ops(&self) -> Vec<MutateOp> {
        self.mutations.borrow().clone()
    }
}

impl PresentationStore for FakeStore {
    fn read(&self, document_id: &str) -> deckfill::Result<Document> {
        if self.fail_read {
            return Err(FillError::DocumentNotFound(document_id.to_string()));
        }
        Ok(self.document.borrow().clone())
    }

    fn batch_mutate(&self, _document_id: &str, ops: &[MutateOp]) -> deckfill::Result<()> {
        for op in ops {
            self.apply(op);
            self.mutations.borrow_mut().push(op.clone());
        }
        Ok(())
    }

    fn upload_asset(&self, bytes: &[u8], _mime_type: &str) -> deckfill::Result<AssetRef> {
        let mut uploaded = self.uploaded.borrow_mut();
        uploaded.push(bytes.to_vec());
        let n = uploaded.len();
        Ok(AssetRef {
            id: format!("asset-{n}"),
            url: format!("https://assets.test/asset-{n}.jpg"),
        })
    }
}

struct FakeGenerator {
    text_calls: Cell<u32>,
    targeted: Option<String>,
    comprehensive: Option<IndexMap<String, String>>,
    image_bytes: Option<Vec<u8>>,
}

impl FakeGenerator {
    fn silent() -> Self {
        FakeGenerator {
            text_calls: Cell::new(0),
            targeted: None,
            comprehensive: None,
            image_bytes: None,
        }
    }
}

impl ContentGenerator for FakeGenerator {
    fn generate_text(&self, _ctx: &GenerationContext) -> deckfill::Result<GeneratedText> {
        self.text_calls.set(self.text_calls.get() + 1);
        Ok(match &self.targeted {
            Some(text) => GeneratedText::Text(text.clone()),
            None => GeneratedText::Blocked,
        })
    }

    fn generate_comprehensive(
        &self,
        _request: &deckfill::generate::ComprehensiveRequest,
    ) -> deckfill::Result<Option<IndexMap<String, String>>> {
        Ok(self.comprehensive.clone())
    }

    fn generate_image(&self, _prompt: &str) -> deckfill::Result<Option<Vec<u8>>> {
        Ok(self.image_bytes.clone())
    }
}

fn text_shape(id: &str, content: &str) -> PageElement {
    PageElement {
        object_id: id.to_string(),
        size: None,
        transform: None,
        element_kind: PageElementKind::Shape(Shape {
            shape_type: None,
            text: Some(TextContent {
                text_elements: Some(vec![TextElement {
                    start_index: None,
                    end_index: None,
                    kind: Some(TextElementKind::TextRun(TextRun {
                        content: Some(content.to_string()),
                    })),
                }]),
            }),
        }),
    }
}

fn sized_shape(id: &str, content: &str, width_in: f64, height_in: f64) -> PageElement {
    let mut element = text_shape(id, content);
    element.size = Some(Size {
        width: Some(Dimension {
            magnitude: Some(width_in),
            unit: Some(Unit::In),
        }),
        height: Some(Dimension {
            magnitude: Some(height_in),
            unit: Some(Unit::In),
        }),
    });
    element
}

fn single_slide(elements: Vec<PageElement>) -> Document {
    Document {
        document_id: "deck-1".into(),
        page_size: None,
        title: Some("Test deck".into()),
        slides: Some(vec![Page {
            object_id: "slide-1".into(),
            page_elements: Some(elements),
        }]),
    }
}

fn mapping() -> PlaceholderMapping {
    PlaceholderMapping::from_json_str(
        r#"{
            "placeholder_mappings": {
                "projectName": {
                    "type": "TITLE",
                    "description": "Name of the project",
                    "auto_fill": { "project_name": null }
                },
                "companyName": {
                    "type": "TITLE",
                    "description": "Name of the company",
                    "auto_fill": { "company_name": null }
                },
                "image_1": {
                    "type": "IMAGE",
                    "description": "Hero image for the deck"
                }
            }
        }"#,
    )
    .unwrap()
}

fn png_square(side: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        side,
        side,
        image::Rgb([40, 90, 160]),
    ));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[test]
fn auto_fill_replaces_without_calling_the_generator() {
    init_logging();
    let store = FakeStore::new(single_slide(vec![text_shape("e1", "Hi {{projectName}}!")]));
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let params = RunParams {
        project_name: "Atlas".into(),
        ..Default::default()
    };
    let outcome = pipeline.run("deck-1", &params).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.placeholders_replaced, 1);
    assert_eq!(generator.text_calls.get(), 0);
    assert_eq!(outcome.content_map.get("projectName").unwrap(), "Atlas");

    let ops = store.ops();
    assert!(ops.iter().any(|op| matches!(
        op,
        MutateOp::ReplaceAllText { find, replace, .. }
            if find == "{{projectName}}" && replace == "Atlas"
    )));
    // The identity field picks up its bold style after replacement.
    assert!(ops
        .iter()
        .any(|op| matches!(op, MutateOp::UpdateTextStyle { object_id, .. } if object_id == "e1")));
}

#[test]
fn repeated_tokens_on_a_slide_are_replaced_once() {
    init_logging();
    let store = FakeStore::new(single_slide(vec![
        text_shape("e1", "{{companyName}}"),
        text_shape("e2", "{{companyName}}"),
    ]));
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let params = RunParams {
        company_name: "Northwind".into(),
        ..Default::default()
    };
    pipeline.run("deck-1", &params).unwrap();

    // Page-scoped replacement handles both shapes; exactly one op is emitted.
    let replaces: Vec<_> = store
        .ops()
        .into_iter()
        .filter(|op| matches!(op, MutateOp::ReplaceAllText { find, .. } if find == "{{companyName}}"))
        .collect();
    assert_eq!(replaces.len(), 1);
}

#[test]
fn hero_image_is_fitted_uploaded_and_placed_before_delete() {
    init_logging();
    let store = FakeStore::new(single_slide(vec![sized_shape(
        "img-slot",
        "{{image_1}}",
        8.47,
        10.63,
    )]));
    let generator = FakeGenerator {
        image_bytes: Some(png_square(1024)),
        ..FakeGenerator::silent()
    };
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let outcome = pipeline.run("deck-1", &RunParams::default()).unwrap();
    assert_eq!(outcome.placeholders_replaced, 1);
    assert!(outcome.skipped.is_empty());

    // The uploaded asset is the cover-fitted JPEG at 72 px/in.
    let uploaded = store.uploaded.borrow();
    assert_eq!(uploaded.len(), 1);
    let decoded = image::load_from_memory(&uploaded[0]).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (610, 765));

    // Create lands before the delete, and the placeholder is gone after.
    let ops = store.ops();
    let create_at = ops
        .iter()
        .position(|op| matches!(op, MutateOp::CreateImage { .. }))
        .unwrap();
    let delete_at = ops
        .iter()
        .position(|op| {
            matches!(op, MutateOp::DeleteElement { object_id } if object_id == "img-slot")
        })
        .unwrap();
    assert!(create_at < delete_at);
    match &ops[create_at] {
        MutateOp::CreateImage { size, .. } => {
            assert!((size.width - 609.84).abs() < 1e-6);
            assert!((size.height - 765.36).abs() < 1e-6);
        }
        _ => unreachable!(),
    }
}

#[test]
fn three_urls_bind_to_the_first_three_of_six_slots() {
    init_logging();
    let elements = (1..=6)
        .map(|i| text_shape(&format!("link-{i}"), &format!("{{{{referenceLink_{i}}}}}")))
        .collect();
    let store = FakeStore::new(single_slide(elements));
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let params = RunParams {
        project_description:
            "Sources: https://example.com/a https://example.com/b www.example.org".into(),
        ..Default::default()
    };
    pipeline.run("deck-1", &params).unwrap();

    let ops = store.ops();
    let label_replacements = ops
        .iter()
        .filter(|op| matches!(
            op,
            MutateOp::ReplaceAllText { find, replace, .. }
                if find.contains("referenceLink") && replace == "Follow Reference Link"
        ))
        .count();
    assert_eq!(label_replacements, 6);

    let link_styles: Vec<&str> = ops
        .iter()
        .filter_map(|op| match op {
            MutateOp::UpdateTextStyle { style, .. } => style.link_url.as_deref(),
            _ => None,
        })
        .collect();
    assert_eq!(
        link_styles,
        vec![
            "https://example.com/a",
            "https://example.com/b",
            "https://www.example.org",
        ]
    );
}

#[test]
fn link_token_sharing_an_element_with_a_text_token_still_gets_its_link() {
    init_logging();
    let store = FakeStore::new(single_slide(vec![text_shape(
        "e1",
        "{{projectName}} {{referenceLink_1}}",
    )]));
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let params = RunParams {
        project_name: "Atlas".into(),
        project_description: "Docs at https://example.com/docs".into(),
        ..Default::default()
    };
    let outcome = pipeline.run("deck-1", &params).unwrap();
    assert_eq!(outcome.placeholders_replaced, 2);

    // Both tokens in the shared element are replaced.
    let document = store.document.borrow();
    let text = document.slides.as_ref().unwrap()[0]
        .page_elements
        .as_ref()
        .unwrap()[0]
        .as_shape()
        .unwrap()
        .text
        .as_ref()
        .unwrap()
        .plain_text();
    assert_eq!(text, "Atlas Follow Reference Link");
    drop(document);

    // The link style covers the label where it actually landed, after the
    // name replacement shortened the element.
    let linked: Vec<(i64, i64)> = store
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            MutateOp::UpdateTextStyle {
                object_id,
                start_index,
                end_index,
                style,
            } if object_id == "e1" && style.link_url.is_some() => {
                Some((start_index, end_index))
            }
            _ => None,
        })
        .collect();
    assert_eq!(linked, vec![(6, 27)]);
}

#[test]
fn every_mutated_element_appears_once_in_the_processed_log() {
    init_logging();
    let store = FakeStore::new(single_slide(vec![
        text_shape("e1", "{{projectName}}"),
        text_shape("e2", "{{conclusion_para}}"),
        text_shape("e3", "{{referenceLink_1}}"),
    ]));
    let generator = FakeGenerator {
        targeted: Some("A focused closing statement.".into()),
        ..FakeGenerator::silent()
    };
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let params = RunParams {
        project_name: "Atlas".into(),
        project_description: "More at https://example.com/docs".into(),
        ..Default::default()
    };
    let outcome = pipeline.run("deck-1", &params).unwrap();
    assert_eq!(outcome.placeholders_replaced, 3);
    assert_eq!(
        outcome.unmatched,
        vec!["conclusion_para".to_string(), "referenceLink_1".to_string()]
    );

    // No element is replaced twice even though styling touches e1 again.
    let mut delete_targets: Vec<String> = Vec::new();
    for op in store.ops() {
        if let MutateOp::DeleteElement { object_id } = op {
            assert!(!delete_targets.contains(&object_id));
            delete_targets.push(object_id);
        }
    }
}

#[test]
fn tokenless_document_succeeds_with_nothing_to_do() -> anyhow::Result<()> {
    init_logging();
    let store = FakeStore::new(single_slide(vec![text_shape("e1", "plain text only")]));
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let outcome = pipeline.run("deck-1", &RunParams::default())?;
    assert!(outcome.success);
    assert_eq!(outcome.placeholders_replaced, 0);
    assert!(store.ops().is_empty());
    Ok(())
}

#[test]
fn missing_document_aborts_the_run() {
    init_logging();
    let mut store = FakeStore::new(single_slide(vec![]));
    store.fail_read = true;
    let generator = FakeGenerator::silent();
    let pipeline = Pipeline::new(&store, &generator, mapping(), Theme::default());

    let err = pipeline.run("deck-1", &RunParams::default()).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, FillError::DocumentNotFound(_)));
}
