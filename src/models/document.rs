use serde::{Deserialize, Serialize};

use crate::models::common::Size;
use crate::models::page::Page;

/// A presentation document as read from the presentation store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The ID of the document.
    #[serde(default, alias = "presentationId")]
    pub document_id: String,

    /// The size of pages in the document.
    pub page_size: Option<Size>,

    /// The slides in the document.
    pub slides: Option<Vec<Page>>,

    /// The title of the document.
    pub title: Option<String>,
}
