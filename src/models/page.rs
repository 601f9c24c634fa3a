use serde::{Deserialize, Serialize};

use crate::models::elements::PageElement;

/// A page (slide) in a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// The object ID for this page. Object IDs used by pages and page
    /// elements share the same namespace.
    #[serde(default)]
    pub object_id: String,

    /// The page elements rendered on the page.
    pub page_elements: Option<Vec<PageElement>>,
}
