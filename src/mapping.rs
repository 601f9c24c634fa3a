//! Static declarative placeholder mapping and the matcher joining scanned
//! tokens against it.

use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::classify::{classify, PlaceholderType};
use crate::errors::{FillError, Result};
use crate::scan::TokenOccurrence;

/// Word-count and style constraints for generated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRequirements {
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    /// Free-form style hint; "concise" and "professional" are recognized.
    pub style: Option<String>,
}

/// A rule filling a placeholder directly from run parameters, with no
/// generator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFillRule {
    /// Fill with the run's company name.
    CompanyName,
    /// Fill with the run's project name.
    ProjectName,
    /// Fill with the run's proposal type, or the declared default.
    ProposalType { default_value: String },
    /// Fill with a fixed literal.
    Static { value: String },
}

/// One entry of the static mapping, keyed by canonical name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingEntry {
    #[serde(rename = "type")]
    pub entry_type: PlaceholderType,
    pub description: String,
    pub content_requirements: ContentRequirements,
    pub auto_fill: Option<AutoFillRule>,
    /// Alternate keys a comprehensive generation result may use for this name.
    pub aliases: Vec<String>,
}

/// The static name → entry table, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderMapping {
    entries: IndexMap<String, MappingEntry>,
}

/// On-disk shape of the mapping file.
#[derive(Debug, Deserialize)]
struct MappingFile {
    placeholder_mappings: IndexMap<String, MappingEntry>,
}

impl PlaceholderMapping {
    pub fn new(entries: IndexMap<String, MappingEntry>) -> Self {
        PlaceholderMapping { entries }
    }

    /// Parses the mapping configuration from its JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: MappingFile = serde_json::from_str(json)
            .map_err(|e| FillError::MappingConfig(format!("malformed mapping file: {e}")))?;
        info!("loaded {} placeholder mappings", file.placeholder_mappings.len());
        Ok(PlaceholderMapping {
            entries: file.placeholder_mappings,
        })
    }

    pub fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.entries.iter()
    }
}

/// A scanned occurrence joined with its (declared or synthesized) mapping.
#[derive(Debug, Clone)]
pub struct MatchedPlaceholder {
    pub occurrence: TokenOccurrence,
    pub entry: MappingEntry,
    /// False when the entry was synthesized from the type classifier.
    pub from_mapping: bool,
}

impl MatchedPlaceholder {
    /// The effective type: the declared one when matched, else the inferred one.
    pub fn placeholder_type(&self) -> PlaceholderType {
        if self.from_mapping {
            self.entry.entry_type
        } else {
            self.occurrence.inferred_type
        }
    }
}

/// The result of joining scanned tokens against the static mapping.
#[derive(Debug, Default)]
pub struct MatchReport {
    pub matched: Vec<MatchedPlaceholder>,
    /// Names missing from the curated mapping. Diagnostic only: these are
    /// still processed with a synthesized entry.
    pub unmatched: Vec<String>,
    pub total_found: usize,
    pub total_matched: usize,
}

/// Joins each occurrence with its mapping entry, synthesizing one from the
/// classifier on a miss. Misses are recorded for observability but never
/// halt processing.
pub fn match_occurrences(
    occurrences: Vec<TokenOccurrence>,
    mapping: &PlaceholderMapping,
) -> MatchReport {
    let total_found = occurrences.len();
    let mut matched = Vec::with_capacity(total_found);
    let mut unmatched = Vec::new();
    let mut total_matched = 0usize;

    for occurrence in occurrences {
        match mapping.get(&occurrence.name) {
            Some(entry) => {
                total_matched += 1;
                matched.push(MatchedPlaceholder {
                    entry: entry.clone(),
                    occurrence,
                    from_mapping: true,
                });
            }
            None => {
                let inferred = classify(&occurrence.name);
                if !unmatched.contains(&occurrence.name) {
                    unmatched.push(occurrence.name.clone());
                }
                matched.push(MatchedPlaceholder {
                    entry: MappingEntry {
                        entry_type: inferred,
                        ..Default::default()
                    },
                    occurrence,
                    from_mapping: false,
                });
            }
        }
    }

    if !unmatched.is_empty() {
        warn!(
            "{} placeholder name(s) missing from the mapping: {}",
            unmatched.len(),
            unmatched.join(", ")
        );
    }
    info!("matched {total_matched}/{total_found} placeholders");

    MatchReport {
        matched,
        unmatched,
        total_found,
        total_matched,
    }
}
