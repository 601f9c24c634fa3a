//! Hyperlink slot binding with pre-mutation identity tracking.
//!
//! Link tokens are replaced by a short display label, and the label's run is
//! styled with the real URL. Element identity is captured before any text
//! mutation runs, because replacement can change run boundaries; the style
//! range itself is computed against a fresh read taken right before the link
//! phase, replaying this phase's own earlier replacements so ranges stay
//! accurate even when several slots share one element.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::mapping::MatchedPlaceholder;
use crate::models::text::utf16_len;
use crate::models::Document;
use crate::store::{MutateOp, TextStyleUpdate};
use crate::theme::{Rgb, Theme};

/// Label shown in place of a raw URL.
pub const DEFAULT_LINK_LABEL: &str = "Follow Reference Link";

/// Slots at or below this 1-based position use the primary color band.
const PRIMARY_BAND_LAST: usize = 3;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(https?://[^\s<>"{}|\\^`\[\]]+|www\.[^\s<>"{}|\\^`\[\]]+)"#)
            .expect("valid url pattern")
    })
}

/// Extracts URLs from free text in document order. Bare `www.` forms are
/// qualified with `https://`.
pub fn extract_urls(text: &str) -> Vec<String> {
    url_pattern()
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str();
            if raw.starts_with("www.") {
                format!("https://{raw}")
            } else {
                raw.to_string()
            }
        })
        .collect()
}

/// Whether a placeholder name belongs to the hyperlink family.
pub fn is_link_slot(name: &str) -> bool {
    name.to_lowercase().contains("link") && !name.to_lowercase().contains("logo")
}

/// Trailing numeric suffix of a name, used to order sibling slots.
fn trailing_index(name: &str) -> u32 {
    let digits: String = name
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().unwrap_or(0)
}

/// One hyperlink placeholder, identified before any mutation runs.
#[derive(Debug, Clone)]
pub struct LinkSlot {
    pub name: String,
    pub slide_id: String,
    pub element_id: String,
    pub raw_token: String,
    pub order: u32,
}

fn element_plain_text(document: &Document, slide_id: &str, element_id: &str) -> Option<String> {
    let slides = document.slides.as_ref()?;
    let slide = slides.iter().find(|s| s.object_id == slide_id)?;
    let elements = slide.page_elements.as_ref()?;
    let element = elements.iter().find(|e| e.object_id == element_id)?;
    let shape = element.as_shape()?;
    Some(shape.text.as_ref()?.plain_text())
}

/// Records every hyperlink slot's element identity before any text mutation
/// runs. Slots are ordered by trailing index, then by discovery order.
pub fn snapshot_slots(matched: &[MatchedPlaceholder]) -> Vec<LinkSlot> {
    let mut slots: Vec<LinkSlot> = matched
        .iter()
        .filter(|m| is_link_slot(&m.occurrence.name))
        .map(|m| LinkSlot {
            name: m.occurrence.name.clone(),
            slide_id: m.occurrence.slide_id.clone(),
            element_id: m.occurrence.element_id.clone(),
            raw_token: m.occurrence.raw_token.clone(),
            order: trailing_index(&m.occurrence.name),
        })
        .collect();
    slots.sort_by_key(|s| s.order);
    debug!("captured {} hyperlink slot(s)", slots.len());
    slots
}

/// A slot bound to its URL, or left generic when URLs run out.
#[derive(Debug, Clone)]
pub struct LinkBinding {
    pub slot: LinkSlot,
    pub url: Option<String>,
    pub color: Rgb,
    pub label: String,
}

/// Resolves the display label, honoring the phrase when the project
/// description spells it out (in its original casing). The label is ASCII,
/// so a match can only start at a char boundary of an ASCII run.
pub fn display_label(description: &str) -> String {
    let needle = DEFAULT_LINK_LABEL;
    for (start, _) in description.char_indices() {
        if let Some(candidate) = description.get(start..start + needle.len()) {
            if candidate.eq_ignore_ascii_case(needle) {
                return candidate.to_string();
            }
        }
    }
    DEFAULT_LINK_LABEL.to_string()
}

/// Pairs the k-th URL with the k-th slot. Surplus slots keep the generic
/// label with no link, color, or underline. The first three slots use the
/// primary band; later ones the secondary.
pub fn bind_links(
    slots: Vec<LinkSlot>,
    urls: &[String],
    theme: &Theme,
    label: &str,
) -> Vec<LinkBinding> {
    if slots.len() < urls.len() {
        warn!(
            "{} url(s) but only {} slot(s); extra urls dropped",
            urls.len(),
            slots.len()
        );
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| LinkBinding {
            url: urls.get(i).cloned(),
            color: if i < PRIMARY_BAND_LAST {
                theme.primary
            } else {
                theme.secondary
            },
            label: label.to_string(),
            slot,
        })
        .collect()
}

/// Ops realizing the bindings against the document as it stands entering
/// the link phase: each token's label replacement, then a ranged style
/// carrying the URL when one was bound.
///
/// Style ranges are in UTF-16 code units, matching the stored text indices.
/// Because the ops apply in order, each element's text is replayed locally
/// so a later slot in the same element is offset past the labels already
/// substituted for its predecessors. Table-cell slots and elements missing
/// from the read get the label replacement but no ranged styling.
pub fn link_ops(document: &Document, bindings: &[LinkBinding]) -> Vec<MutateOp> {
    let mut ops = Vec::new();
    let mut texts: HashMap<(String, String), String> = HashMap::new();

    for binding in bindings {
        let slot = &binding.slot;
        ops.push(MutateOp::ReplaceAllText {
            find: slot.raw_token.clone(),
            replace: binding.label.clone(),
            page_object_ids: vec![slot.slide_id.clone()],
        });

        let key = (slot.slide_id.clone(), slot.element_id.clone());
        if !texts.contains_key(&key) {
            match element_plain_text(document, &slot.slide_id, &slot.element_id) {
                Some(text) => {
                    texts.insert(key.clone(), text);
                }
                None => continue,
            }
        }
        let Some(text) = texts.get_mut(&key) else {
            continue;
        };

        if let Some(url) = &binding.url {
            let Some(at) = text.find(&slot.raw_token) else {
                warn!("token {} not found in element {}", slot.raw_token, slot.element_id);
                continue;
            };
            let start = utf16_len(&text[..at]) as i64;
            ops.push(MutateOp::UpdateTextStyle {
                object_id: slot.element_id.clone(),
                start_index: start,
                end_index: start + utf16_len(&binding.label) as i64,
                style: TextStyleUpdate {
                    link_url: Some(url.clone()),
                    foreground: Some(binding.color),
                    underline: Some(true),
                    ..Default::default()
                },
            });
        }

        // Unlinked labels shift later offsets in the element too.
        *text = text.replace(&slot.raw_token, &binding.label);
    }
    ops
}
