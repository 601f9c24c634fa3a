pub mod common;
pub mod document;
pub mod elements;
pub mod page;
pub mod shape;
pub mod table;
pub mod text;

pub use common::{AffineTransform, Dimension, Size, Unit};
pub use document::Document;
pub use elements::{PageElement, PageElementKind};
pub use page::Page;
pub use shape::{Shape, ShapeType};
pub use table::{Table, TableCell, TableRow};
pub use text::{TextContent, TextElement, TextElementKind, TextRun};
