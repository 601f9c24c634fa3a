use serde::{Deserialize, Serialize};

use crate::models::text::TextContent;

/// The type of a shape. Only the types the fill pipeline distinguishes are
/// listed; anything else deserializes as `Other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShapeType {
    /// The shape type is unspecified.
    TypeUnspecified,
    /// Text box shape.
    TextBox,
    /// Rectangle shape.
    Rectangle,
    /// Round corner rectangle shape.
    RoundRectangle,
    /// Ellipse shape.
    Ellipse,
    /// Any other shape type.
    #[default]
    #[serde(other)]
    Other,
}

/// A generic shape rendered on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    /// The type of the shape.
    pub shape_type: Option<ShapeType>,

    /// The text content of the shape.
    pub text: Option<TextContent>,
}
