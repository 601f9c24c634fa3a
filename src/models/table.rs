use serde::{Deserialize, Serialize};

use crate::models::common::Dimension;
use crate::models::text::TextContent;

/// Properties and contents of each cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Row span of the cell. Read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_span: Option<i32>,

    /// Column span of the cell. Read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_span: Option<i32>,

    /// The text content of the cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

/// Properties and contents of each row in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Height of the row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_height: Option<Dimension>,

    /// Properties and contents of each cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_cells: Option<Vec<TableCell>>,
}

/// A PageElement kind representing a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Number of rows in the table.
    #[serde(default)]
    pub rows: i32,
    /// Number of columns in the table.
    #[serde(default)]
    pub columns: i32,

    /// Properties and contents of each row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_rows: Option<Vec<TableRow>>,
}
