//! Token scanning over a document tree.
//!
//! Walks every slide's shapes and table cells looking for `{{name}}` tokens
//! and reports each occurrence with the geometry of its containing element.
//! Scanning is read-only; an empty result is a normal outcome that callers
//! log, not an error.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::classify::{classify, PlaceholderType};
use crate::models::common::{AffineTransform, Size};
use crate::models::{Document, Page, PageElement};
use crate::normalize::{is_quote_sentinel, normalize, QUOTE_SENTINEL};

/// Where a token occurrence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Shape,
    TableCell,
}

/// A single `{{name}}` occurrence inside the document.
///
/// Identity is `(slide_id, element_id, raw_token)`; the same normalized name
/// may occur on several slides and each occurrence is replaced independently.
#[derive(Debug, Clone)]
pub struct TokenOccurrence {
    /// The literal token as found, braces included.
    pub raw_token: String,
    /// The canonical name used for mapping lookups.
    pub name: String,
    /// Type inferred from the name alone; the matcher may override it.
    pub inferred_type: PlaceholderType,
    pub slide_id: String,
    pub element_id: String,
    pub source: TokenSource,
    /// Geometry of the containing element, as read.
    pub size: Option<Size>,
    pub transform: Option<AffineTransform>,
    /// Leading text of the containing element, for diagnostics.
    pub text_snippet: String,
    /// True for the quote sentinel, whose content is the quote glyph itself.
    pub is_quote_variant: bool,
}

impl TokenOccurrence {
    /// The `(slide_id, element_id)` pair identifying the mutated element.
    pub fn element_key(&self) -> (String, String) {
        (self.slide_id.clone(), self.element_id.clone())
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid token pattern"))
}

const SNIPPET_LEN: usize = 120;

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}

/// Scans one block of element text, appending an occurrence per token found.
fn scan_text(
    text: &str,
    slide: &Page,
    element: &PageElement,
    source: TokenSource,
    out: &mut Vec<TokenOccurrence>,
) {
    for capture in token_pattern().captures_iter(text) {
        let raw_name = &capture[1];

        if is_quote_sentinel(raw_name) {
            out.push(TokenOccurrence {
                raw_token: format!("{{{{{}}}}}", raw_name.trim()),
                name: QUOTE_SENTINEL.to_string(),
                inferred_type: PlaceholderType::Quote,
                slide_id: slide.object_id.clone(),
                element_id: element.object_id.clone(),
                source,
                size: element.size.clone(),
                transform: element.transform.clone(),
                text_snippet: snippet(text),
                is_quote_variant: true,
            });
            continue;
        }

        let Some(name) = normalize(raw_name) else {
            debug!("skipping empty token name in element {}", element.object_id);
            continue;
        };

        out.push(TokenOccurrence {
            raw_token: format!("{{{{{name}}}}}"),
            inferred_type: classify(&name),
            name,
            slide_id: slide.object_id.clone(),
            element_id: element.object_id.clone(),
            source,
            size: element.size.clone(),
            transform: element.transform.clone(),
            text_snippet: snippet(text),
            is_quote_variant: false,
        });
    }
}

/// Finds every token occurrence in the document, in slide order.
///
/// Both shapes and table cells are visited; table-cell occurrences carry the
/// owning table element's geometry, since cells have no transform of their own.
pub fn scan_document(document: &Document) -> Vec<TokenOccurrence> {
    let mut found = Vec::new();

    let Some(slides) = &document.slides else {
        return found;
    };

    for slide in slides {
        let Some(elements) = &slide.page_elements else {
            continue;
        };
        for element in elements {
            if let Some(shape) = element.as_shape() {
                if let Some(text) = &shape.text {
                    let content = text.plain_text();
                    if !content.is_empty() {
                        scan_text(&content, slide, element, TokenSource::Shape, &mut found);
                    }
                }
            }

            if let Some(table) = element.as_table() {
                let Some(rows) = &table.table_rows else {
                    continue;
                };
                for row in rows {
                    let Some(cells) = &row.table_cells else {
                        continue;
                    };
                    for cell in cells {
                        if let Some(text) = &cell.text {
                            let content = text.plain_text();
                            if !content.is_empty() {
                                scan_text(
                                    &content,
                                    slide,
                                    element,
                                    TokenSource::TableCell,
                                    &mut found,
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    debug!("scan found {} token occurrence(s)", found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::Dimension;
    use crate::models::elements::PageElementKind;
    use crate::models::shape::Shape;
    use crate::models::table::{Table, TableCell, TableRow};
    use crate::models::text::{TextContent, TextElement, TextElementKind, TextRun};

    fn text_content(content: &str) -> TextContent {
        TextContent {
            text_elements: Some(vec![TextElement {
                start_index: Some(0),
                end_index: Some(content.len() as i32),
                kind: Some(TextElementKind::TextRun(TextRun {
                    content: Some(content.to_string()),
                })),
            }]),
        }
    }

    fn shape_element(id: &str, content: &str) -> PageElement {
        PageElement {
            object_id: id.to_string(),
            size: Some(Size {
                width: Some(Dimension::points(200.0)),
                height: Some(Dimension::points(100.0)),
            }),
            transform: Some(AffineTransform {
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                translate_x: Some(10.0),
                translate_y: Some(20.0),
                ..Default::default()
            }),
            element_kind: PageElementKind::Shape(Shape {
                shape_type: None,
                text: Some(text_content(content)),
            }),
        }
    }

    fn table_element(id: &str, cell_texts: &[&str]) -> PageElement {
        let cells = cell_texts
            .iter()
            .map(|t| TableCell {
                row_span: None,
                column_span: None,
                text: Some(text_content(t)),
            })
            .collect();
        PageElement {
            object_id: id.to_string(),
            size: None,
            transform: None,
            element_kind: PageElementKind::Table(Table {
                rows: 1,
                columns: cell_texts.len() as i32,
                table_rows: Some(vec![TableRow {
                    row_height: None,
                    table_cells: Some(cells),
                }]),
            }),
        }
    }

    fn document(elements: Vec<PageElement>) -> Document {
        Document {
            document_id: "doc".to_string(),
            page_size: None,
            slides: Some(vec![Page {
                object_id: "slide_1".to_string(),
                page_elements: Some(elements),
            }]),
            title: Some("test".to_string()),
        }
    }

    #[test]
    fn finds_tokens_in_shapes() {
        let doc = document(vec![shape_element("e1", "Welcome {{projectName}}!")]);
        let found = scan_document(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "projectName");
        assert_eq!(found[0].raw_token, "{{projectName}}");
        assert_eq!(found[0].inferred_type, PlaceholderType::Title);
        assert_eq!(found[0].source, TokenSource::Shape);
        assert_eq!(found[0].slide_id, "slide_1");
        assert_eq!(found[0].element_id, "e1");
    }

    #[test]
    fn finds_tokens_in_table_cells() {
        let doc = document(vec![table_element("t1", &["{{budget}}", "plain", "{{days}}"])]);
        let found = scan_document(&doc);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|o| o.source == TokenSource::TableCell));
        assert!(found.iter().all(|o| o.element_id == "t1"));
        assert_eq!(found[0].name, "budget");
        assert_eq!(found[1].name, "days");
    }

    #[test]
    fn multiple_occurrences_are_distinct() {
        let doc = Document {
            document_id: "doc".to_string(),
            page_size: None,
            slides: Some(vec![
                Page {
                    object_id: "s1".to_string(),
                    page_elements: Some(vec![shape_element("e1", "{{companyName}}")]),
                },
                Page {
                    object_id: "s2".to_string(),
                    page_elements: Some(vec![shape_element("e2", "{{companyName}}")]),
                },
            ]),
            title: None,
        };
        let found = scan_document(&doc);
        assert_eq!(found.len(), 2);
        assert_ne!(found[0].element_key(), found[1].element_key());
    }

    #[test]
    fn quote_sentinel_is_flagged() {
        let doc = document(vec![shape_element("e1", "{{u0022}}quote here")]);
        let found = scan_document(&doc);
        assert_eq!(found.len(), 1);
        assert!(found[0].is_quote_variant);
        assert_eq!(found[0].name, "u0022");
        assert_eq!(found[0].inferred_type, PlaceholderType::Quote);
    }

    #[test]
    fn tokenless_document_yields_empty_list() {
        let doc = document(vec![shape_element("e1", "no tokens here")]);
        assert!(scan_document(&doc).is_empty());
    }

    #[test]
    fn unnormalizable_names_are_skipped() {
        let doc = document(vec![shape_element("e1", "{{\u{201d}}} and {{  }}")]);
        assert!(scan_document(&doc).is_empty());
    }
}
