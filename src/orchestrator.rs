//! End-to-end run orchestration.
//!
//! One run is a fixed sequence of stages over a single document: scan,
//! match, snapshot link identities, plan, then apply images, colors, text,
//! links and styling in that order. The hard ordering exists because later
//! stages depend on earlier state: link element identities must be captured
//! before text mutates, the background reuses the hero image's bytes, and
//! both the link ranges and styling need fresh reads that reflect the
//! replacements already applied.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::classify::PlaceholderType;
use crate::errors::Result;
use crate::generate::{image_prompt, ContentGenerator};
use crate::geometry::{resolve_target_size, ManualDims};
use crate::links::{bind_links, display_label, extract_urls, is_link_slot, link_ops, snapshot_slots};
use crate::mapping::{match_occurrences, MatchedPlaceholder, PlaceholderMapping};
use crate::placer::{background_ops, fit_to_target, placement_ops};
use crate::plan::{build_plan, ContentPlan, RunParams, Value};
use crate::scan::scan_document;
use crate::store::{MutateOp, PresentationStore};
use crate::styling::{StyleEngine, StyleSheet};
use crate::theme::Theme;

/// Progress of a run through its stages. Transitions are strictly forward;
/// Done and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Scanned,
    Matched,
    Planned,
    ImagesApplied,
    ColorsApplied,
    TextApplied,
    LinksApplied,
    Styled,
    Done,
    Failed,
}

impl RunState {
    fn rank(self) -> u8 {
        match self {
            RunState::Scanned => 0,
            RunState::Matched => 1,
            RunState::Planned => 2,
            RunState::ImagesApplied => 3,
            RunState::ColorsApplied => 4,
            RunState::TextApplied => 5,
            RunState::LinksApplied => 6,
            RunState::Styled => 7,
            RunState::Done => 8,
            RunState::Failed => 9,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// A run may only move one stage forward, or to Failed from any live
    /// stage.
    pub fn can_advance(self, to: RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == RunState::Failed || to.rank() == self.rank() + 1
    }
}

/// Mutation targets already handled this run, plus the append-only log of
/// every element mutation emitted. Whole-element work (images, backgrounds,
/// color swatches) claims the `(slide_id, element_id)` pair; text work
/// claims per token, so sibling tokens sharing one element each keep their
/// own replacement.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    elements: HashSet<(String, String)>,
    tokens: HashSet<(String, String, String)>,
    log: Vec<(String, String)>,
}

impl ProcessedSet {
    /// Claims a whole element. Returns false when it was already claimed.
    pub fn claim(&mut self, slide_id: &str, element_id: &str) -> bool {
        let key = (slide_id.to_string(), element_id.to_string());
        if !self.elements.insert(key.clone()) {
            debug!("element {element_id} already processed, skipping");
            return false;
        }
        self.log.push(key);
        true
    }

    /// Claims one token's text work within an element. Independent of the
    /// element-level claims.
    pub fn claim_token(&mut self, slide_id: &str, element_id: &str, raw_token: &str) -> bool {
        let key = (
            slide_id.to_string(),
            element_id.to_string(),
            raw_token.to_string(),
        );
        if !self.tokens.insert(key) {
            debug!("token {raw_token} in {element_id} already processed, skipping");
            return false;
        }
        true
    }

    pub fn log(&self) -> &[(String, String)] {
        &self.log
    }
}

/// What a finished (or failed) run looked like.
#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub document_id: String,
    pub document_url: String,
    pub placeholders_replaced: usize,
    /// Name → applied text, for caller-side review.
    pub content_map: IndexMap<String, String>,
    /// Names skipped after a non-fatal failure.
    pub skipped: Vec<String>,
    /// Names absent from the mapping (still processed, reported for review).
    pub unmatched: Vec<String>,
}

const DOCUMENT_URL_BASE: &str = "https://docs.google.com/presentation/d";

fn document_url(document_id: &str) -> String {
    format!("{DOCUMENT_URL_BASE}/{document_id}/edit")
}

/// The configured pipeline for one or more runs.
pub struct Pipeline<'a> {
    store: &'a dyn PresentationStore,
    generator: &'a dyn ContentGenerator,
    mapping: PlaceholderMapping,
    styles: StyleSheet,
    manual_dims: ManualDims,
    theme: Theme,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn PresentationStore,
        generator: &'a dyn ContentGenerator,
        mapping: PlaceholderMapping,
        theme: Theme,
    ) -> Self {
        Pipeline {
            store,
            generator,
            mapping,
            styles: StyleSheet::built_in(),
            manual_dims: ManualDims::new(),
            theme,
        }
    }

    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_manual_dims(mut self, manual_dims: ManualDims) -> Self {
        self.manual_dims = manual_dims;
        self
    }

    /// Runs the whole fill against one document.
    ///
    /// Per-placeholder failures are logged and skipped; store failures that
    /// are fatal (auth, missing document) abort with an error, leaving the
    /// run in the Failed state.
    pub fn run(&self, document_id: &str, params: &RunParams) -> Result<RunOutcome> {
        let mut state = RunState::Scanned;
        match self.run_phases(document_id, params, &mut state) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let failed = advance(state, RunState::Failed);
                warn!("run against {document_id} aborted in state {failed:?}: {e}");
                Err(e)
            }
        }
    }

    fn run_phases(
        &self,
        document_id: &str,
        params: &RunParams,
        state: &mut RunState,
    ) -> Result<RunOutcome> {
        let mut processed = ProcessedSet::default();
        let mut skipped: Vec<String> = Vec::new();
        let mut replaced = 0usize;

        let document = self.store.read(document_id)?;
        let occurrences = scan_document(&document);
        info!("scanned {document_id}: {} occurrence(s)", occurrences.len());

        if occurrences.is_empty() {
            return Ok(RunOutcome {
                success: true,
                document_id: document_id.to_string(),
                document_url: document_url(document_id),
                placeholders_replaced: 0,
                content_map: IndexMap::new(),
                skipped,
                unmatched: Vec::new(),
            });
        }

        let report = match_occurrences(occurrences, &self.mapping);
        *state = advance(*state, RunState::Matched);

        // Link element identities must be captured before any text mutation.
        let link_slots = snapshot_slots(&report.matched);

        let plan = build_plan(&report.matched, params, self.generator)?;
        *state = advance(*state, RunState::Planned);

        // Images, hero first so the background stage can reuse its bytes.
        let hero_bytes = self.apply_images(
            document_id,
            &report.matched,
            &plan,
            params,
            &mut processed,
            &mut skipped,
            &mut replaced,
        )?;
        self.apply_background(
            document_id,
            &report.matched,
            hero_bytes.as_deref(),
            &mut processed,
            &mut skipped,
            &mut replaced,
        )?;
        *state = advance(*state, RunState::ImagesApplied);

        self.apply_colors(
            document_id,
            &report.matched,
            &plan,
            &mut processed,
            &mut replaced,
        )?;
        *state = advance(*state, RunState::ColorsApplied);

        self.apply_text(
            document_id,
            &report.matched,
            &plan,
            &mut processed,
            &mut replaced,
        )?;
        *state = advance(*state, RunState::TextApplied);

        // Links, addressed through the pre-mutation identity snapshot, with
        // ranges computed against a fresh read so earlier replacements in
        // the same element cannot shift them.
        let urls = extract_urls(&params.project_description);
        let label = display_label(&params.project_description);
        let bindings = bind_links(link_slots, &urls, &self.theme, &label);
        let claimed: Vec<_> = bindings
            .into_iter()
            .filter(|b| {
                processed.claim_token(&b.slot.slide_id, &b.slot.element_id, &b.slot.raw_token)
            })
            .collect();
        let before_links = self.store.read(document_id)?;
        let ops = link_ops(&before_links, &claimed);
        replaced += claimed.len();
        self.store.batch_mutate(document_id, &ops)?;
        *state = advance(*state, RunState::LinksApplied);

        // Styling sees the document as it exists after every replacement.
        let refreshed = self.store.read(document_id)?;
        let mut engine = StyleEngine::new(&self.theme, &self.styles);
        let style_ops = engine.style_ops(&refreshed, &report.matched);
        self.store.batch_mutate(document_id, &style_ops)?;
        *state = advance(*state, RunState::Styled);

        *state = advance(*state, RunState::Done);
        debug!("run finished in state {state:?}");

        let content_map = plan
            .iter()
            .filter_map(|(name, entry)| {
                entry.value.as_text().map(|t| (name.clone(), t.to_string()))
            })
            .collect();

        Ok(RunOutcome {
            success: true,
            document_id: document_id.to_string(),
            document_url: document_url(document_id),
            placeholders_replaced: replaced,
            content_map,
            skipped,
            unmatched: report.unmatched,
        })
    }

    fn is_background(name: &str) -> bool {
        name.to_lowercase().contains("background")
    }

    /// Places every non-background image. Returns the hero's raw bytes for
    /// the background stage.
    #[allow(clippy::too_many_arguments)]
    fn apply_images(
        &self,
        document_id: &str,
        matched: &[MatchedPlaceholder],
        plan: &ContentPlan,
        params: &RunParams,
        processed: &mut ProcessedSet,
        skipped: &mut Vec<String>,
        replaced: &mut usize,
    ) -> Result<Option<Vec<u8>>> {
        let mut hero_bytes: Option<Vec<u8>> = None;

        for m in matched {
            if m.placeholder_type() != PlaceholderType::Image
                || Self::is_background(&m.occurrence.name)
            {
                continue;
            }
            let occurrence = &m.occurrence;
            if !processed.claim(&occurrence.slide_id, &occurrence.element_id) {
                continue;
            }

            // An override URL is used as-is; otherwise the image is
            // generated, fitted and uploaded.
            let asset_url = match plan.get(&occurrence.name).map(|e| &e.value) {
                Some(Value::ImageRef(url)) => Some(url.clone()),
                _ => {
                    let prompt = image_prompt(
                        &occurrence.name,
                        &m.entry.description,
                        &params.project_description,
                        &self.theme,
                    );
                    match self.generator.generate_image(&prompt) {
                        Ok(Some(bytes)) => {
                            if hero_bytes.is_none() {
                                hero_bytes = Some(bytes.clone());
                            }
                            self.fit_and_upload(occurrence, &bytes, params, skipped)?
                        }
                        Ok(None) => {
                            debug!("no image produced for {}", occurrence.name);
                            skipped.push(occurrence.name.clone());
                            None
                        }
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            warn!("image generation failed for {}: {e}", occurrence.name);
                            skipped.push(occurrence.name.clone());
                            None
                        }
                    }
                }
            };

            let Some(asset_url) = asset_url else {
                continue;
            };
            let Some(target) = resolve_target_size(
                &occurrence.name,
                occurrence.size.as_ref(),
                &self.manual_dims,
            ) else {
                skipped.push(occurrence.name.clone());
                continue;
            };
            let ops = placement_ops(
                &occurrence.slide_id,
                &occurrence.element_id,
                &asset_url,
                target,
                occurrence.transform.as_ref(),
            );
            self.store.batch_mutate(document_id, &ops)?;
            *replaced += 1;
        }
        Ok(hero_bytes)
    }

    fn fit_and_upload(
        &self,
        occurrence: &crate::scan::TokenOccurrence,
        bytes: &[u8],
        params: &RunParams,
        skipped: &mut Vec<String>,
    ) -> Result<Option<String>> {
        let Some(target) = resolve_target_size(
            &occurrence.name,
            occurrence.size.as_ref(),
            &self.manual_dims,
        ) else {
            skipped.push(occurrence.name.clone());
            return Ok(None);
        };
        let fitted = match fit_to_target(bytes, target, params.max_crop_fraction) {
            Ok(fitted) => fitted,
            Err(e) => {
                warn!("image fit failed for {}: {e}", occurrence.name);
                skipped.push(occurrence.name.clone());
                return Ok(None);
            }
        };
        match self.store.upload_asset(&fitted.bytes, fitted.mime_type) {
            Ok(asset) => Ok(Some(asset.url)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("asset upload failed for {}: {e}", occurrence.name);
                skipped.push(occurrence.name.clone());
                Ok(None)
            }
        }
    }

    /// Fills slide backgrounds, preferring the hero's unfitted bytes so the
    /// deck stays visually coherent.
    fn apply_background(
        &self,
        document_id: &str,
        matched: &[MatchedPlaceholder],
        hero_bytes: Option<&[u8]>,
        processed: &mut ProcessedSet,
        skipped: &mut Vec<String>,
        replaced: &mut usize,
    ) -> Result<()> {
        for m in matched {
            if m.placeholder_type() != PlaceholderType::Image
                || !Self::is_background(&m.occurrence.name)
            {
                continue;
            }
            let occurrence = &m.occurrence;
            if !processed.claim(&occurrence.slide_id, &occurrence.element_id) {
                continue;
            }

            let bytes = match hero_bytes {
                Some(bytes) => Some(bytes.to_vec()),
                None => {
                    let prompt = image_prompt(
                        &occurrence.name,
                        &m.entry.description,
                        "",
                        &self.theme,
                    );
                    match self.generator.generate_image(&prompt) {
                        Ok(maybe) => maybe,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            warn!("background generation failed: {e}");
                            None
                        }
                    }
                }
            };
            let Some(bytes) = bytes else {
                skipped.push(occurrence.name.clone());
                continue;
            };

            match self.store.upload_asset(&bytes, "image/jpeg") {
                Ok(asset) => {
                    let ops = background_ops(
                        &occurrence.slide_id,
                        &occurrence.element_id,
                        &asset.url,
                    );
                    self.store.batch_mutate(document_id, &ops)?;
                    *replaced += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("background upload failed: {e}");
                    skipped.push(occurrence.name.clone());
                }
            }
        }
        Ok(())
    }

    /// Fills color placeholders with theme fills by slot convention.
    fn apply_colors(
        &self,
        document_id: &str,
        matched: &[MatchedPlaceholder],
        plan: &ContentPlan,
        processed: &mut ProcessedSet,
        replaced: &mut usize,
    ) -> Result<()> {
        let mut ops = Vec::new();
        for m in matched {
            if m.placeholder_type() != PlaceholderType::Color {
                continue;
            }
            let occurrence = &m.occurrence;
            if !processed.claim(&occurrence.slide_id, &occurrence.element_id) {
                continue;
            }

            let lower = occurrence.name.to_lowercase();
            let color = match plan.get(&occurrence.name).map(|e| &e.value) {
                Some(Value::Color(color)) => *color,
                _ if lower.contains("color1") || lower.contains("circle_1") => self.theme.primary,
                _ if lower.contains("color2") || lower.contains("circle_2") => {
                    self.theme.secondary
                }
                _ => self.theme.accent,
            };
            ops.push(MutateOp::SetShapeFill {
                object_id: occurrence.element_id.clone(),
                color,
            });
            // The token text is cleared so the swatch shows only the fill.
            ops.push(MutateOp::ReplaceAllText {
                find: occurrence.raw_token.clone(),
                replace: String::new(),
                page_object_ids: vec![occurrence.slide_id.clone()],
            });
            *replaced += 1;
        }
        self.store.batch_mutate(document_id, &ops)?;
        Ok(())
    }

    /// Applies every planned text value as one batch of replacements.
    fn apply_text(
        &self,
        document_id: &str,
        matched: &[MatchedPlaceholder],
        plan: &ContentPlan,
        processed: &mut ProcessedSet,
        replaced: &mut usize,
    ) -> Result<()> {
        let mut ops = Vec::new();
        let mut seen_tokens: HashSet<(String, String)> = HashSet::new();

        for m in matched {
            let occurrence = &m.occurrence;
            if !m.placeholder_type().is_text_family() && !occurrence.is_quote_variant {
                continue;
            }
            if is_link_slot(&occurrence.name) {
                continue;
            }
            let Some(text) = plan.text_for(&occurrence.name) else {
                continue;
            };
            if !processed.claim_token(&occurrence.slide_id, &occurrence.element_id, &occurrence.raw_token)
            {
                continue;
            }
            // Replacement is page-scoped by token, not element-scoped.
            if !seen_tokens.insert((occurrence.slide_id.clone(), occurrence.raw_token.clone())) {
                continue;
            }
            ops.push(MutateOp::ReplaceAllText {
                find: occurrence.raw_token.clone(),
                replace: text.to_string(),
                page_object_ids: vec![occurrence.slide_id.clone()],
            });
            *replaced += 1;
        }
        self.store.batch_mutate(document_id, &ops)?;
        Ok(())
    }
}

/// Forward-only state transition. Illegal moves are a bug in the sequence
/// above, caught in debug builds.
fn advance(from: RunState, to: RunState) -> RunState {
    debug_assert!(
        from.can_advance(to),
        "illegal run state transition {from:?} -> {to:?}"
    );
    debug!("run state {from:?} -> {to:?}");
    to
}
