//! # deckfill
//!
//! Fills templated slide decks whose `{{placeholder}}` tokens mark where
//! text, images, colors and hyperlinks belong. A run scans the document,
//! matches tokens against a declarative mapping, assembles a complete
//! content plan, then applies every replacement while preserving each
//! placeholder's geometry on the slide.
//!
//! The two seams are [`store::PresentationStore`] (where decks live) and
//! [`generate::ContentGenerator`] (where content comes from); everything
//! between them is deterministic given the same inputs.

pub mod classify;
pub mod errors;
pub mod generate;
pub mod geometry;
pub mod links;
pub mod mapping;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod placer;
pub mod plan;
pub mod scan;
pub mod store;
pub mod styling;
pub mod theme;

pub use classify::{classify, PlaceholderType};
pub use errors::{FillError, Result};
pub use generate::{ContentGenerator, GeneratedText, GenerationContext};
pub use mapping::{match_occurrences, MappingEntry, MatchReport, PlaceholderMapping};
pub use orchestrator::{Pipeline, RunOutcome, RunState};
pub use plan::{build_plan, ContentPlan, PlanSource, RunParams, Value};
pub use scan::{scan_document, TokenOccurrence, TokenSource};
pub use store::{AssetRef, HttpStore, MutateOp, PresentationStore};
pub use theme::{Rgb, Theme};
