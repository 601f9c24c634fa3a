use serde::{Deserialize, Serialize};

use crate::models::common::{AffineTransform, Size};
use crate::models::shape::Shape;
use crate::models::table::Table;

/// The specific kind of PageElement represented as an enum with associated
/// data. The JSON representation uses the field name as the key (e.g.
/// "shape": {...}, "table": {...}). Kinds the pipeline does not touch
/// (videos, lines, charts) collapse into `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageElementKind {
    /// A generic shape.
    Shape(Shape),
    /// A table page element.
    Table(Table),
    /// An image page element.
    Image(serde_json::Value),
    /// Any other element kind, kept opaque.
    #[serde(untagged)]
    Other(serde_json::Value),
}

/// A visual element rendered on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    /// The object ID for this page element. Object IDs used by pages and
    /// page elements share the same namespace.
    pub object_id: String,

    /// The size of the page element.
    pub size: Option<Size>,

    /// The transform of the page element.
    pub transform: Option<AffineTransform>,

    /// The specific kind of element and its properties.
    #[serde(flatten)]
    pub element_kind: PageElementKind,
}

impl PageElement {
    pub fn as_shape(&self) -> Option<&Shape> {
        match &self.element_kind {
            PageElementKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.element_kind {
            PageElementKind::Table(table) => Some(table),
            _ => None,
        }
    }
}
