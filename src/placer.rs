//! Geometry-preserving image placement.
//!
//! Generated images rarely share the placeholder's aspect ratio, so they are
//! cover-fitted: scaled until both axes cover the target, then center-cropped
//! to the exact pixel size. The placeholder's footprint on the slide never
//! changes; only pixels are discarded.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::{debug, warn};

use crate::errors::{FillError, Result};
use crate::geometry::SizePt;
use crate::models::common::AffineTransform;
use crate::store::MutateOp;

/// Pixels rendered per point. Slides render at 72 px/in and 1 pt = 1/72 in.
const PX_PER_PT: f64 = 1.0;

/// Image bytes fitted to an exact target footprint.
#[derive(Debug, Clone)]
pub struct FittedImage {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub mime_type: &'static str,
}

/// Cover-fits raw image bytes to the target size.
///
/// `max_crop_fraction` bounds how much of an axis may be discarded before a
/// warning is logged; the crop still proceeds, since a warped image would be
/// worse than a tight one.
pub fn fit_to_target(
    bytes: &[u8],
    target: SizePt,
    max_crop_fraction: f64,
) -> Result<FittedImage> {
    let target_w = (target.width * PX_PER_PT).round() as u32;
    let target_h = (target.height * PX_PER_PT).round() as u32;
    if target_w == 0 || target_h == 0 {
        return Err(FillError::InvalidInput(format!(
            "degenerate image target {:.1}x{:.1} pt",
            target.width, target.height
        )));
    }

    let source = image::load_from_memory(bytes)?;
    let (src_w, src_h) = (source.width(), source.height());
    if src_w == 0 || src_h == 0 {
        return Err(FillError::InvalidInput("empty source image".into()));
    }

    // Scale up to the larger of the two per-axis ratios so both axes cover
    // the target, then crop the overhang symmetrically.
    let scale = f64::max(
        target_w as f64 / src_w as f64,
        target_h as f64 / src_h as f64,
    );
    let scaled_w = ((src_w as f64 * scale).round() as u32).max(target_w);
    let scaled_h = ((src_h as f64 * scale).round() as u32).max(target_h);

    let crop_x = (scaled_w - target_w) as f64 / scaled_w as f64;
    let crop_y = (scaled_h - target_h) as f64 / scaled_h as f64;
    if crop_x > max_crop_fraction || crop_y > max_crop_fraction {
        warn!(
            "cover fit discards {:.0}%/{:.0}% of width/height (limit {:.0}%)",
            crop_x * 100.0,
            crop_y * 100.0,
            max_crop_fraction * 100.0
        );
    }

    let resized = source.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3);
    let cropped = resized.crop_imm(
        (scaled_w - target_w) / 2,
        (scaled_h - target_h) / 2,
        target_w,
        target_h,
    );
    debug!("fitted {src_w}x{src_h} -> {target_w}x{target_h} px (scale {scale:.3})");

    // JPEG has no alpha channel.
    let flat = DynamicImage::ImageRgb8(cropped.to_rgb8());
    let mut out = Vec::new();
    flat.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;

    Ok(FittedImage {
        bytes: out,
        width_px: target_w,
        height_px: target_h,
        mime_type: "image/jpeg",
    })
}

/// Ops replacing a placeholder element with an image at the same footprint.
///
/// The create precedes the delete so the slide never passes through a state
/// where the element has vanished with no successor.
pub fn placement_ops(
    slide_id: &str,
    element_id: &str,
    asset_url: &str,
    size: SizePt,
    transform: Option<&AffineTransform>,
) -> Vec<MutateOp> {
    vec![
        MutateOp::CreateImage {
            url: asset_url.to_string(),
            page_object_id: slide_id.to_string(),
            size,
            transform: crate::geometry::normalized_transform(transform),
        },
        MutateOp::DeleteElement {
            object_id: element_id.to_string(),
        },
    ]
}

/// Ops filling a slide background from an image and removing the marker
/// shape that requested it.
pub fn background_ops(slide_id: &str, element_id: &str, asset_url: &str) -> Vec<MutateOp> {
    vec![
        MutateOp::SetSlideBackground {
            page_object_id: slide_id.to_string(),
            url: asset_url.to_string(),
        },
        MutateOp::DeleteElement {
            object_id: element_id.to_string(),
        },
    ]
}
