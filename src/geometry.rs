//! Unit conversion and geometry plausibility checks.
//!
//! Element sizes arrive in EMU or PT depending on how the deck was authored,
//! and sometimes with no unit tag at all. Everything downstream works in
//! points, so resolution happens here, together with the guard against
//! corrupt reads that would otherwise produce absurd image targets.

use indexmap::IndexMap;
use log::warn;

use crate::models::common::{AffineTransform, Dimension, Size, Unit};

pub const PT_PER_IN: f64 = 72.0;
pub const EMU_PER_IN: f64 = 914_400.0;
pub const EMU_PER_PT: f64 = EMU_PER_IN / PT_PER_IN;

/// Untagged magnitudes above this are assumed to be EMU. No real slide
/// element is ten thousand points across.
const EMU_HEURISTIC_THRESHOLD: f64 = 10_000.0;

/// Per-axis sizes beyond this are treated as corrupt reads.
pub const MAX_PLAUSIBLE_PT: f64 = 1000.0;

/// A resolved element size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePt {
    pub width: f64,
    pub height: f64,
}

impl SizePt {
    pub const fn new(width: f64, height: f64) -> Self {
        SizePt { width, height }
    }

    pub fn from_inches(width_in: f64, height_in: f64) -> Self {
        SizePt {
            width: width_in * PT_PER_IN,
            height: height_in * PT_PER_IN,
        }
    }

    pub fn is_plausible(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width <= MAX_PLAUSIBLE_PT
            && self.height <= MAX_PLAUSIBLE_PT
    }
}

/// Resolves one dimension to points, applying the EMU heuristic when the
/// unit tag is absent.
pub fn dimension_pt(dimension: &Dimension) -> Option<f64> {
    let magnitude = dimension.magnitude?;
    let pt = match dimension.unit {
        Some(Unit::Pt) => magnitude,
        Some(Unit::Emu) => magnitude / EMU_PER_PT,
        Some(Unit::In) => magnitude * PT_PER_IN,
        Some(Unit::UnitUnspecified) | None => {
            if magnitude > EMU_HEURISTIC_THRESHOLD {
                magnitude / EMU_PER_PT
            } else {
                magnitude
            }
        }
    };
    Some(pt)
}

/// Resolves a full element size to points, or None when either axis is
/// missing.
pub fn size_pt(size: &Size) -> Option<SizePt> {
    let width = size.width.as_ref().and_then(dimension_pt)?;
    let height = size.height.as_ref().and_then(dimension_pt)?;
    Some(SizePt { width, height })
}

/// Curated fallback dimensions (in inches) consulted when an element's read
/// geometry fails the plausibility guard.
#[derive(Debug, Clone, Default)]
pub struct ManualDims {
    entries: IndexMap<String, (f64, f64)>,
}

impl ManualDims {
    pub fn new() -> Self {
        ManualDims::default()
    }

    /// Registers fallback width and height, in inches.
    pub fn insert_inches(&mut self, name: &str, width_in: f64, height_in: f64) {
        self.entries.insert(name.to_string(), (width_in, height_in));
    }

    pub fn get_pt(&self, name: &str) -> Option<SizePt> {
        self.entries
            .get(name)
            .map(|&(w, h)| SizePt::from_inches(w, h))
    }
}

/// Resolves the target size for a placement, in priority order: the read
/// geometry when plausible, then the manual table, else None (skip the
/// placement rather than distort it).
pub fn resolve_target_size(
    name: &str,
    size: Option<&Size>,
    manual: &ManualDims,
) -> Option<SizePt> {
    if let Some(resolved) = size.and_then(size_pt) {
        if resolved.is_plausible() {
            return Some(resolved);
        }
        warn!(
            "implausible geometry for {name}: {:.0}x{:.0} pt, consulting manual dims",
            resolved.width, resolved.height
        );
    }
    let fallback = manual.get_pt(name);
    if fallback.is_none() {
        warn!("no usable geometry for {name}, skipping placement");
    }
    fallback
}

/// Copies a transform with scaling normalized to identity. Replacement
/// images carry their size explicitly, so any inherited scale would be
/// applied twice.
pub fn normalized_transform(transform: Option<&AffineTransform>) -> AffineTransform {
    let mut out = transform.cloned().unwrap_or_default();
    out.scale_x = Some(1.0);
    out.scale_y = Some(1.0);
    if out.unit.is_none() {
        out.unit = Some(Unit::Pt);
    }
    out
}
