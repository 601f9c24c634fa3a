use serde::{Deserialize, Serialize};

/// A run of text that all has the same styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// The text of this run.
    pub content: Option<String>,
}

/// Text automatically generated by the host (slide numbers and the like).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoText {
    /// The rendered content of this auto text, if available.
    pub content: Option<String>,
}

/// The specific kind of text element. The JSON representation uses the field
/// name as the key (e.g. "textRun": {...}).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextElementKind {
    /// A run of text with uniform styling.
    TextRun(TextRun),
    /// Host-generated text.
    AutoText(AutoText),
    /// A marker for the beginning of a paragraph. Carries no content.
    ParagraphMarker(serde_json::Value),
}

/// A single unit of a shape's or cell's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// The zero-based start index of this element, in UTF-16 code units.
    pub start_index: Option<i32>,
    /// The zero-based end index of this element, exclusive, in UTF-16 code units.
    pub end_index: Option<i32>,
    /// The kind of this element and its content.
    #[serde(flatten)]
    pub kind: Option<TextElementKind>,
}

/// The text content of a shape or table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// The text contents, broken down into component elements.
    pub text_elements: Option<Vec<TextElement>>,
}

/// Length of a string in UTF-16 code units, the unit text indices use.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

impl TextContent {
    /// Concatenates the plain text of all runs and auto-text elements.
    pub fn plain_text(&self) -> String {
        let mut buffer = String::new();
        if let Some(elements) = &self.text_elements {
            for element in elements {
                match &element.kind {
                    Some(TextElementKind::TextRun(run)) => {
                        if let Some(content) = &run.content {
                            buffer.push_str(content);
                        }
                    }
                    Some(TextElementKind::AutoText(auto)) => {
                        if let Some(content) = &auto.content {
                            buffer.push_str(content);
                        }
                    }
                    _ => {}
                }
            }
        }
        buffer
    }
}
