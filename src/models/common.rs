use serde::{Deserialize, Serialize};

/// Specifies a unit of length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    /// The units are unknown. Should not be used.
    #[serde(rename = "UNIT_UNSPECIFIED")]
    UnitUnspecified,
    /// An English Metric Unit (EMU). 1 EMU = 1/914400 inch.
    Emu,
    /// A point (pt). 1 pt = 1/72 inch.
    Pt,
    /// An inch. Only used for caller-supplied manual dimensions.
    In,
}

/// A magnitude in a specific unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    /// The magnitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    /// The units for magnitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl Dimension {
    pub fn points(magnitude: f64) -> Self {
        Dimension {
            magnitude: Some(magnitude),
            unit: Some(Unit::Pt),
        }
    }
}

/// A width and height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    /// The width. Missing width does not inherit from parents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    /// The height. Missing height does not inherit from parents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
}

/// AffineTransform uses a 3x3 matrix with an implied last row of [ 0 0 1 ]
/// to transform source coordinates (x,y) into destination coordinates (x', y').
///
/// Formula:
/// x' = scaleX * x + shearX * y + translateX;
/// y' = shearY * x + scaleY * y + translateY;
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    /// The X coordinate scaling element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    /// The Y coordinate scaling element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// The X coordinate shearing element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shear_x: Option<f64>,
    /// The Y coordinate shearing element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shear_y: Option<f64>,
    /// The X coordinate translation element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate_x: Option<f64>,
    /// The Y coordinate translation element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate_y: Option<f64>,
    /// Clockwise rotation angle, in degrees, where present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    /// The units for the translation elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}
