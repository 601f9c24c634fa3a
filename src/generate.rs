//! Content generation seam.
//!
//! The pipeline never talks to a model directly; it goes through the
//! [`ContentGenerator`] trait so runs can be driven by a real backend or an
//! in-memory fake. A blocked or empty result is a fallback trigger for the
//! planner, never an error.

use indexmap::IndexMap;

use crate::errors::Result;
use crate::theme::Theme;

/// Outcome of a single targeted text generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedText {
    Text(String),
    /// The backend refused the request (safety filter, quota). The planner
    /// falls back; this is not an error.
    Blocked,
}

/// Everything a targeted generation call may draw on.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub placeholder_name: String,
    /// The mapping entry's description of what belongs here.
    pub description: String,
    pub project_name: String,
    pub company_name: String,
    pub project_description: String,
    /// For paragraphs, the already-generated sibling heading.
    pub heading_context: Option<String>,
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    pub style: Option<String>,
}

/// A single comprehensive-generation request covering every text placeholder
/// at once.
#[derive(Debug, Clone, Default)]
pub struct ComprehensiveRequest {
    pub project_name: String,
    pub company_name: String,
    pub project_description: String,
    pub placeholder_names: Vec<String>,
}

/// The generation backend.
///
/// `Ok(None)` from the comprehensive or image calls means the backend had
/// nothing to offer; callers fall through to the next tier.
pub trait ContentGenerator {
    fn generate_text(&self, ctx: &GenerationContext) -> Result<GeneratedText>;

    fn generate_comprehensive(
        &self,
        request: &ComprehensiveRequest,
    ) -> Result<Option<IndexMap<String, String>>>;

    fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>>;
}

/// Assembles the prompt for an image placeholder, weaving the theme palette
/// into the request so generated assets match the deck.
pub fn image_prompt(
    placeholder_name: &str,
    description: &str,
    project_description: &str,
    theme: &Theme,
) -> String {
    let subject = if description.is_empty() {
        placeholder_name
    } else {
        description
    };
    format!(
        "Professional presentation image: {subject}. Context: {project_description}. \
         Use a palette built around {} and {}, clean composition, no embedded text.",
        theme.primary.to_hex(),
        theme.accent.to_hex()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_prompt_prefers_description_and_carries_palette() {
        let theme = Theme::default();
        let prompt = image_prompt("image_1", "a city skyline", "transit app", &theme);
        assert!(prompt.contains("a city skyline"));
        assert!(prompt.contains("transit app"));
        assert!(prompt.contains(&theme.primary.to_hex()));
        assert!(!prompt.contains("image_1"));

        let bare = image_prompt("image_1", "", "transit app", &theme);
        assert!(bare.contains("image_1"));
    }
}
