//! Semantic type inference for placeholder names without a mapping entry.

use serde::{Deserialize, Serialize};

/// The semantic type of a placeholder, declared by the mapping or inferred
/// from the name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceholderType {
    /// Plain body text.
    #[default]
    Text,
    /// A generated or extracted raster image.
    Image,
    /// A solid fill color applied to the containing shape.
    Color,
    /// A single pictographic character rendered as text.
    Emoji,
    /// A slide or section title.
    Title,
    /// A subtitle or tagline.
    Subtitle,
    /// A multi-sentence body paragraph.
    Paragraph,
    /// The literal quote glyph sentinel.
    Quote,
}

impl PlaceholderType {
    /// Whether values of this type are produced by the text-generation tiers.
    pub fn is_text_family(self) -> bool {
        matches!(
            self,
            PlaceholderType::Text
                | PlaceholderType::Title
                | PlaceholderType::Subtitle
                | PlaceholderType::Paragraph
                | PlaceholderType::Emoji
        )
    }
}

/// Exact image-family names recognized by rule 1.
const IMAGE_NAMES: &[&str] = &[
    "logo",
    "companylogo",
    "image_1",
    "image_2",
    "image_3",
    "backgroundimage",
    "chart_1",
];

/// Image-family name prefixes recognized by rule 1.
const IMAGE_PREFIXES: &[&str] = &["scope_img", "d_i_image"];

/// Infers a placeholder type from a canonical name.
///
/// Ordered rule precedence, first match wins. The ordering is load-bearing:
/// a name containing both "logo" and "color" resolves to IMAGE or COLOR
/// depending on which rule fires first, so reordering changes behavior.
pub fn classify(name: &str) -> PlaceholderType {
    let lower = name.trim().to_lowercase();

    // 1. Known image families, matched exactly or by prefix.
    if IMAGE_NAMES.contains(&lower.as_str())
        || IMAGE_PREFIXES.iter().any(|p| lower.starts_with(p))
    {
        return PlaceholderType::Image;
    }
    // 2. Anything naming a color.
    if lower.contains("color") {
        return PlaceholderType::Color;
    }
    // 3. logo_N variants that are not the company-logo alias render emoji.
    if lower.contains("logo") && lower != "companylogo" {
        return PlaceholderType::Emoji;
    }
    // 4. Headings.
    if lower.contains("heading") || lower.contains("head") {
        return PlaceholderType::Title;
    }
    // 5. Body paragraphs.
    if lower.contains("para") || lower.contains("paragraph") {
        return PlaceholderType::Paragraph;
    }
    // 6. Titles and *name fields.
    if lower.contains("title") || lower.ends_with("name") {
        return PlaceholderType::Title;
    }
    // 7. Subtitles and taglines.
    if lower.contains("subtitle") || lower.contains("tagline") {
        return PlaceholderType::Subtitle;
    }
    PlaceholderType::Text
}
