//! Content plan assembly.
//!
//! The plan is built completely before any mutation runs, one keyed value
//! per placeholder name, filled tier by tier: overrides, auto-fill,
//! comprehensive generation, targeted generation, safe defaults. A key set
//! by an earlier tier is never overwritten by a later one.

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::classify::PlaceholderType;
use crate::errors::Result;
use crate::generate::{
    ComprehensiveRequest, ContentGenerator, GeneratedText, GenerationContext,
};
use crate::links::is_link_slot;
use crate::mapping::{AutoFillRule, ContentRequirements, MappingEntry, MatchedPlaceholder};
use crate::normalize::{normalize, QUOTE_GLYPH};
use crate::theme::Rgb;

/// A planned replacement value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// URL of an externally supplied image asset.
    ImageRef(String),
    Color(Rgb),
    Hyperlink(String),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Which tier produced a value. Earlier variants always win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlanSource {
    Override,
    AutoFill,
    Comprehensive,
    Targeted,
    Default,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub value: Value,
    pub source: PlanSource,
}

/// The finished name → value plan.
#[derive(Debug, Clone, Default)]
pub struct ContentPlan {
    entries: IndexMap<String, PlanEntry>,
}

impl ContentPlan {
    /// Inserts unless the key is already planned. Returns whether the value
    /// was taken.
    pub fn set(&mut self, key: &str, value: Value, source: PlanSource) -> bool {
        if self.entries.contains_key(key) {
            debug!("plan already holds {key}, keeping earlier tier");
            return false;
        }
        self.entries.insert(key.to_string(), PlanEntry { value, source });
        true
    }

    pub fn get(&self, key: &str) -> Option<&PlanEntry> {
        self.entries.get(key)
    }

    pub fn text_for(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|e| e.value.as_text())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PlanEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-supplied parameters for one run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub project_name: String,
    pub company_name: String,
    pub proposal_type: Option<String>,
    pub project_description: String,
    /// Explicit name → text overrides, the highest tier.
    pub overrides: IndexMap<String, String>,
    /// Attempts per targeted generation before falling through.
    pub retries: u32,
    /// Largest fraction of an axis the image fit may crop away silently.
    pub max_crop_fraction: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            project_name: String::new(),
            company_name: String::new(),
            proposal_type: None,
            project_description: String::new(),
            overrides: IndexMap::new(),
            retries: 2,
            max_crop_fraction: 0.25,
        }
    }
}

/// One unique placeholder name with its resolved entry and type.
struct PlanTarget {
    name: String,
    entry: MappingEntry,
    placeholder_type: PlaceholderType,
    is_quote: bool,
}

fn collect_targets(matched: &[MatchedPlaceholder]) -> Vec<PlanTarget> {
    let mut targets: Vec<PlanTarget> = Vec::new();
    for m in matched {
        if targets.iter().any(|t| t.name == m.occurrence.name) {
            continue;
        }
        targets.push(PlanTarget {
            name: m.occurrence.name.clone(),
            entry: m.entry.clone(),
            placeholder_type: m.placeholder_type(),
            is_quote: m.occurrence.is_quote_variant,
        });
    }
    targets
}

/// `key: value` lines in the project description whose key names a known
/// placeholder act as overrides.
fn description_overrides(
    description: &str,
    targets: &[PlanTarget],
) -> IndexMap<String, String> {
    let mut overrides = IndexMap::new();
    for line in description.lines() {
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };
        // A URL's scheme separator is not a key delimiter.
        if raw_value.starts_with("//") {
            continue;
        }
        let Some(key) = normalize(raw_key) else {
            continue;
        };
        let value = raw_value.trim();
        if value.is_empty() {
            continue;
        }
        if targets.iter().any(|t| t.name == key) {
            overrides.insert(key, value.to_string());
        }
    }
    overrides
}

fn override_value(target: &PlanTarget, raw: &str) -> Value {
    match target.placeholder_type {
        PlaceholderType::Image if raw.starts_with("http") => Value::ImageRef(raw.to_string()),
        PlaceholderType::Color => Rgb::from_hex(raw)
            .map(Value::Color)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
        _ => Value::Text(raw.to_string()),
    }
}

fn auto_fill_value(rule: &AutoFillRule, params: &RunParams) -> Option<String> {
    let text = match rule {
        AutoFillRule::CompanyName => params.company_name.clone(),
        AutoFillRule::ProjectName => params.project_name.clone(),
        AutoFillRule::ProposalType { default_value } => params
            .proposal_type
            .clone()
            .unwrap_or_else(|| default_value.clone()),
        AutoFillRule::Static { value } => value.clone(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Whether tiers 2-4 may produce text for this target. Images, colors and
/// hyperlink slots are handled by their own stages.
fn text_eligible(target: &PlanTarget) -> bool {
    target.placeholder_type.is_text_family()
        && !target.is_quote
        && !is_link_slot(&target.name)
}

const FILLER_WORDS: &[&str] = &["very", "really", "quite", "rather", "somewhat", "fairly"];

/// Truncates to `max_words`, counting words but preserving line breaks.
fn truncate_words(text: &str, max_words: usize) -> String {
    let mut kept = Vec::new();
    let mut count = 0usize;
    for line in text.split('\n') {
        let mut line_words = Vec::new();
        for word in line.split_whitespace() {
            if count >= max_words {
                break;
            }
            line_words.push(word);
            count += 1;
        }
        kept.push(line_words.join(" "));
        if count >= max_words {
            break;
        }
    }
    kept.join("\n").trim_end().to_string()
}

/// Applies the entry's word and style constraints to generated text.
pub fn enforce_requirements(text: &str, requirements: &ContentRequirements) -> String {
    let mut out = text.trim().to_string();

    let style = requirements.style.as_deref().unwrap_or("");
    if style.eq_ignore_ascii_case("concise") {
        out = out
            .split('\n')
            .map(|line| {
                line.split_whitespace()
                    .filter(|w| {
                        let bare = w.trim_matches(|c: char| !c.is_alphanumeric());
                        !FILLER_WORDS.iter().any(|f| bare.eq_ignore_ascii_case(f))
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    if let Some(max) = requirements.max_words {
        let count = out.split_whitespace().count();
        if count > max {
            out = truncate_words(&out, max);
        }
    }

    if style.eq_ignore_ascii_case("professional") {
        let mut chars = out.chars();
        if let Some(first) = chars.next() {
            out = first.to_uppercase().collect::<String>() + chars.as_str();
        }
        let words = out.split_whitespace().count();
        if words >= 5 && !out.ends_with(['.', '!', '?', ':']) {
            out.push('.');
        }
    }

    out
}

fn humanize(name: &str) -> String {
    name.replace(['_', '-'], " ").trim().to_string()
}

/// Never-blank per-type fallback text.
fn safe_default(target: &PlanTarget, params: &RunParams) -> String {
    match target.placeholder_type {
        PlaceholderType::Title => {
            if params.project_name.is_empty() {
                humanize(&target.name)
            } else {
                params.project_name.clone()
            }
        }
        PlaceholderType::Subtitle => {
            if params.company_name.is_empty() {
                "Prepared for your review".to_string()
            } else {
                format!("Prepared by {}", params.company_name)
            }
        }
        PlaceholderType::Paragraph => {
            "Details for this section will be finalized together during kickoff.".to_string()
        }
        PlaceholderType::Emoji => "\u{2B50}".to_string(),
        _ => humanize(&target.name),
    }
}

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

/// Targeted generation with bounded retries. `Ok(None)` means the tier gave
/// nothing for this target.
fn targeted_text(
    generator: &dyn ContentGenerator,
    ctx: &GenerationContext,
    retries: u32,
) -> Option<String> {
    for attempt in 0..=retries {
        match generator.generate_text(ctx) {
            Ok(GeneratedText::Text(text)) if !text.trim().is_empty() => return Some(text),
            Ok(GeneratedText::Text(_)) | Ok(GeneratedText::Blocked) => {
                debug!("generation blocked for {}", ctx.placeholder_name);
                return None;
            }
            Err(e) => {
                warn!(
                    "generation failed for {} (attempt {}/{}): {e}",
                    ctx.placeholder_name,
                    attempt + 1,
                    retries + 1
                );
            }
        }
    }
    None
}

/// Builds the full content plan for one run.
pub fn build_plan(
    matched: &[MatchedPlaceholder],
    params: &RunParams,
    generator: &dyn ContentGenerator,
) -> Result<ContentPlan> {
    let targets = collect_targets(matched);
    let mut plan = ContentPlan::default();

    // Tier 0: explicit overrides, description overrides, the quote glyph.
    for target in &targets {
        if target.is_quote {
            plan.set(&target.name, Value::Text(QUOTE_GLYPH.to_string()), PlanSource::Override);
        }
    }
    let description_found = description_overrides(&params.project_description, &targets);
    for target in &targets {
        let raw = params
            .overrides
            .get(&target.name)
            .or_else(|| description_found.get(&target.name));
        if let Some(raw) = raw {
            plan.set(&target.name, override_value(target, raw), PlanSource::Override);
        }
    }

    // Tier 1: auto-fill straight from run parameters.
    for target in &targets {
        if plan.contains(&target.name) {
            continue;
        }
        if let Some(rule) = &target.entry.auto_fill {
            if let Some(text) = auto_fill_value(rule, params) {
                plan.set(&target.name, Value::Text(text), PlanSource::AutoFill);
            }
        }
    }

    // Tier 2: one comprehensive call covering every open text target.
    let open: Vec<&PlanTarget> = targets
        .iter()
        .filter(|t| !plan.contains(&t.name) && text_eligible(t))
        .collect();
    if !open.is_empty() {
        let request = ComprehensiveRequest {
            project_name: params.project_name.clone(),
            company_name: params.company_name.clone(),
            project_description: params.project_description.clone(),
            placeholder_names: open.iter().map(|t| t.name.clone()).collect(),
        };
        match generator.generate_comprehensive(&request) {
            Ok(Some(generated)) => {
                for target in &open {
                    let hit = generated.get(&target.name).or_else(|| {
                        target
                            .entry
                            .aliases
                            .iter()
                            .find_map(|alias| generated.get(alias))
                    });
                    if let Some(text) = hit {
                        if !text.trim().is_empty() {
                            let text =
                                enforce_requirements(text, &target.entry.content_requirements);
                            plan.set(&target.name, Value::Text(text), PlanSource::Comprehensive);
                        }
                    }
                }
            }
            Ok(None) => debug!("comprehensive generation offered nothing"),
            Err(e) => warn!("comprehensive generation failed, falling back: {e}"),
        }
    }

    // Tier 3: targeted generation, headings before their paired paragraphs
    // so each paragraph prompt can cite its heading.
    let mut ordered: Vec<&PlanTarget> = targets
        .iter()
        .filter(|t| !plan.contains(&t.name) && text_eligible(t))
        .collect();
    ordered.sort_by_key(|t| match t.placeholder_type {
        PlaceholderType::Title => 0u8,
        _ => 1u8,
    });

    for target in ordered {
        let heading_context = if target.placeholder_type == PlaceholderType::Paragraph {
            let index = trailing_index(&target.name);
            targets
                .iter()
                .find(|t| {
                    t.placeholder_type == PlaceholderType::Title
                        && trailing_index(&t.name) == index
                })
                .and_then(|t| plan.text_for(&t.name).map(str::to_string))
        } else {
            None
        };

        let ctx = GenerationContext {
            placeholder_name: target.name.clone(),
            description: target.entry.description.clone(),
            project_name: params.project_name.clone(),
            company_name: params.company_name.clone(),
            project_description: params.project_description.clone(),
            heading_context,
            min_words: target.entry.content_requirements.min_words,
            max_words: target.entry.content_requirements.max_words,
            style: target.entry.content_requirements.style.clone(),
        };
        if let Some(text) = targeted_text(generator, &ctx, params.retries) {
            let text = enforce_requirements(&text, &target.entry.content_requirements);
            plan.set(&target.name, Value::Text(text), PlanSource::Targeted);
        }
    }

    // Tier 4: safe defaults so no text placeholder is ever left blank.
    for target in &targets {
        if plan.contains(&target.name) || !text_eligible(target) {
            continue;
        }
        plan.set(
            &target.name,
            Value::Text(safe_default(target, params)),
            PlanSource::Default,
        );
    }

    info!("plan holds {} value(s)", plan.len());
    Ok(plan)
}
