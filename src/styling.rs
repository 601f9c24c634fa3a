//! Post-replacement text styling with automatic contrast.
//!
//! Styling runs last, after every replacement, against a fresh read of the
//! document. Rules resolve theme keys through the run's theme; a per-run
//! memo keeps repeated names stable without any global state.

use indexmap::IndexMap;
use log::debug;

use crate::mapping::MatchedPlaceholder;
use crate::models::text::utf16_len;
use crate::models::Document;
use crate::store::{MutateOp, TextStyleUpdate};
use crate::theme::{Rgb, Theme};

const DARK_TEXT: Rgb = Rgb::new(0.121, 0.161, 0.216); // #1f2937
const LIGHT_TEXT: Rgb = Rgb::new(0.976, 0.98, 0.984); // #f9fafb
const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

/// Perceived luminance in `0.0..=1.0`.
pub fn relative_luminance(color: Rgb) -> f32 {
    0.299 * color.red + 0.587 * color.green + 0.114 * color.blue
}

/// Picks a readable foreground for the given background: dark text on light
/// grounds, light text on dark grounds. Threshold 0.5.
pub fn contrast_foreground(background: Rgb) -> Rgb {
    if relative_luminance(background) > 0.5 {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// How one placeholder family is styled after replacement.
#[derive(Debug, Clone, Default)]
pub struct StyleRule {
    /// Theme key resolved at apply time; None means a literal color.
    pub theme_color_key: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// Used when the theme key is absent or unknown.
    pub fallback_color: Option<Rgb>,
    /// Explicit size in points; None leaves the template's size alone.
    pub font_size_pt: Option<f64>,
}

/// Name (or name prefix) to rule table.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: IndexMap<String, StyleRule>,
}

impl StyleSheet {
    pub fn new() -> Self {
        StyleSheet::default()
    }

    /// The built-in sheet: white bold identity fields, accent for the scope
    /// family, primary and secondary for the timeline family.
    pub fn built_in() -> Self {
        let mut sheet = StyleSheet::new();
        for name in ["projectName", "companyName", "proposalName"] {
            sheet.insert(
                name,
                StyleRule {
                    bold: true,
                    fallback_color: Some(WHITE),
                    ..Default::default()
                },
            );
        }
        sheet.insert(
            "scope_",
            StyleRule {
                theme_color_key: Some("accent".into()),
                ..Default::default()
            },
        );
        sheet.insert(
            "timeline_head",
            StyleRule {
                theme_color_key: Some("primary".into()),
                bold: true,
                ..Default::default()
            },
        );
        sheet.insert(
            "timeline_para",
            StyleRule {
                theme_color_key: Some("secondary".into()),
                ..Default::default()
            },
        );
        sheet
    }

    pub fn insert(&mut self, name_or_prefix: &str, rule: StyleRule) {
        self.rules.insert(name_or_prefix.to_string(), rule);
    }

    /// Exact match first, then the longest matching prefix.
    pub fn rule_for(&self, name: &str) -> Option<&StyleRule> {
        if let Some(rule) = self.rules.get(name) {
            return Some(rule);
        }
        self.rules
            .iter()
            .filter(|(key, _)| name.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, rule)| rule)
    }
}

/// Applies the sheet over a fresh document read.
pub struct StyleEngine<'a> {
    theme: &'a Theme,
    sheet: &'a StyleSheet,
    /// Name to resolved color, so repeated names stay identical in one run.
    memo: IndexMap<String, Rgb>,
}

impl<'a> StyleEngine<'a> {
    pub fn new(theme: &'a Theme, sheet: &'a StyleSheet) -> Self {
        StyleEngine {
            theme,
            sheet,
            memo: IndexMap::new(),
        }
    }

    fn resolve_color(&mut self, name: &str, rule: &StyleRule) -> Option<Rgb> {
        if let Some(&cached) = self.memo.get(name) {
            return Some(cached);
        }
        let color = rule
            .theme_color_key
            .as_deref()
            .and_then(|key| self.theme.by_key(key))
            .or(rule.fallback_color)?;
        self.memo.insert(name.to_string(), color);
        Some(color)
    }

    /// Emits one batched style op per surviving element. Elements no longer
    /// present in the document (deleted placeholders) are skipped silently.
    pub fn style_ops(
        &mut self,
        document: &Document,
        matched: &[MatchedPlaceholder],
    ) -> Vec<MutateOp> {
        let mut ops = Vec::new();
        let mut styled: Vec<String> = Vec::new();

        for m in matched {
            let element_id = &m.occurrence.element_id;
            if styled.iter().any(|id| id == element_id) {
                continue;
            }
            let Some(rule) = self.sheet.rule_for(&m.occurrence.name) else {
                continue;
            };
            let Some(length) = element_text_len(document, &m.occurrence.slide_id, element_id)
            else {
                debug!("element {element_id} gone before styling, skipping");
                continue;
            };
            if length == 0 {
                continue;
            }

            let rule = rule.clone();
            let mut style = TextStyleUpdate::default();
            if rule.bold {
                style.bold = Some(true);
            }
            if rule.italic {
                style.italic = Some(true);
            }
            style.font_size_pt = rule.font_size_pt;
            style.foreground = self.resolve_color(&m.occurrence.name, &rule);
            if style.is_empty() {
                continue;
            }

            styled.push(element_id.clone());
            ops.push(MutateOp::UpdateTextStyle {
                object_id: element_id.clone(),
                start_index: 0,
                end_index: length as i64,
                style,
            });
        }
        ops
    }
}

fn element_text_len(document: &Document, slide_id: &str, element_id: &str) -> Option<usize> {
    let slides = document.slides.as_ref()?;
    let slide = slides.iter().find(|s| s.object_id == slide_id)?;
    let element = slide
        .page_elements
        .as_ref()?
        .iter()
        .find(|e| e.object_id == element_id)?;
    // Range indices are in UTF-16 code units, matching the text model.
    let text = element.as_shape()?.text.as_ref()?.plain_text();
    Some(utf16_len(text.trim_end_matches('\n')))
}
