//! Presentation storage seam and the HTTP-backed implementation.
//!
//! Mutations are expressed as [`MutateOp`] values and submitted in batches;
//! the op enum owns the translation to the remote batch-update wire shape so
//! the rest of the pipeline never builds raw JSON.

use std::env;
use std::time::Duration;

use log::{debug, info};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::errors::{FillError, Result};
use crate::geometry::SizePt;
use crate::models::common::AffineTransform;
use crate::models::Document;
use crate::theme::Rgb;

/// Environment variable holding the bearer token for [`HttpStore`].
pub const ACCESS_TOKEN_VAR: &str = "DECKFILL_ACCESS_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A stored asset reachable by URL from the presentation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub id: String,
    pub url: String,
}

/// Text style fields applied by [`MutateOp::UpdateTextStyle`]. Only set
/// fields are written; unset fields are left untouched on the element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyleUpdate {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub foreground: Option<Rgb>,
    pub link_url: Option<String>,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f64>,
}

impl TextStyleUpdate {
    fn style_value(&self) -> Value {
        let mut style = serde_json::Map::new();
        if let Some(bold) = self.bold {
            style.insert("bold".into(), json!(bold));
        }
        if let Some(italic) = self.italic {
            style.insert("italic".into(), json!(italic));
        }
        if let Some(underline) = self.underline {
            style.insert("underline".into(), json!(underline));
        }
        if let Some(color) = self.foreground {
            style.insert(
                "foregroundColor".into(),
                json!({ "opaqueColor": { "rgbColor": color } }),
            );
        }
        if let Some(url) = &self.link_url {
            style.insert("link".into(), json!({ "url": url }));
        }
        if let Some(family) = &self.font_family {
            style.insert("fontFamily".into(), json!(family));
        }
        if let Some(size) = self.font_size_pt {
            style.insert(
                "fontSize".into(),
                json!({ "magnitude": size, "unit": "PT" }),
            );
        }
        Value::Object(style)
    }

    /// The update mask naming exactly the fields being written.
    fn fields(&self) -> String {
        let mut fields = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.underline.is_some() {
            fields.push("underline");
        }
        if self.foreground.is_some() {
            fields.push("foregroundColor");
        }
        if self.link_url.is_some() {
            fields.push("link");
        }
        if self.font_family.is_some() {
            fields.push("fontFamily");
        }
        if self.font_size_pt.is_some() {
            fields.push("fontSize");
        }
        fields.join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// One mutation against the stored presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutateOp {
    /// Replaces every occurrence of `find` on the named pages.
    ReplaceAllText {
        find: String,
        replace: String,
        page_object_ids: Vec<String>,
    },
    DeleteElement {
        object_id: String,
    },
    /// Creates an image sized and positioned like the element it replaces.
    CreateImage {
        url: String,
        page_object_id: String,
        size: SizePt,
        transform: AffineTransform,
    },
    /// Stretches an image across the slide background.
    SetSlideBackground {
        page_object_id: String,
        url: String,
    },
    SetShapeFill {
        object_id: String,
        color: Rgb,
    },
    /// Styles a fixed character range of an element's text.
    UpdateTextStyle {
        object_id: String,
        start_index: i64,
        end_index: i64,
        style: TextStyleUpdate,
    },
}

impl MutateOp {
    /// Serializes the op to its wire request object.
    pub fn to_request(&self) -> Value {
        match self {
            MutateOp::ReplaceAllText {
                find,
                replace,
                page_object_ids,
            } => json!({
                "replaceAllText": {
                    "containsText": { "text": find, "matchCase": true },
                    "replaceText": replace,
                    "pageObjectIds": page_object_ids,
                }
            }),
            MutateOp::DeleteElement { object_id } => json!({
                "deleteObject": { "objectId": object_id }
            }),
            MutateOp::CreateImage {
                url,
                page_object_id,
                size,
                transform,
            } => json!({
                "createImage": {
                    "url": url,
                    "elementProperties": {
                        "pageObjectId": page_object_id,
                        "size": {
                            "width": { "magnitude": size.width, "unit": "PT" },
                            "height": { "magnitude": size.height, "unit": "PT" },
                        },
                        "transform": transform,
                    }
                }
            }),
            MutateOp::SetSlideBackground {
                page_object_id,
                url,
            } => json!({
                "updatePageProperties": {
                    "objectId": page_object_id,
                    "pageProperties": {
                        "pageBackgroundFill": {
                            "stretchedPictureFill": { "contentUrl": url }
                        }
                    },
                    "fields": "pageBackgroundFill",
                }
            }),
            MutateOp::SetShapeFill { object_id, color } => json!({
                "updateShapeProperties": {
                    "objectId": object_id,
                    "shapeProperties": {
                        "shapeBackgroundFill": {
                            "solidFill": { "color": { "rgbColor": color } }
                        }
                    },
                    "fields": "shapeBackgroundFill.solidFill.color",
                }
            }),
            MutateOp::UpdateTextStyle {
                object_id,
                start_index,
                end_index,
                style,
            } => json!({
                "updateTextStyle": {
                    "objectId": object_id,
                    "textRange": {
                        "type": "FIXED_RANGE",
                        "startIndex": start_index,
                        "endIndex": end_index,
                    },
                    "style": style.style_value(),
                    "fields": style.fields(),
                }
            }),
        }
    }
}

/// Storage backend for presentations.
pub trait PresentationStore {
    /// Reads the full document tree.
    fn read(&self, document_id: &str) -> Result<Document>;

    /// Applies a batch of mutations atomically, in order.
    fn batch_mutate(&self, document_id: &str, ops: &[MutateOp]) -> Result<()>;

    /// Uploads raw asset bytes and returns a URL the backend can fetch.
    fn upload_asset(&self, bytes: &[u8], mime_type: &str) -> Result<AssetRef>;
}

/// HTTP implementation of [`PresentationStore`].
pub struct HttpStore {
    http: reqwest::blocking::Client,
    token: String,
    base_url: String,
    upload_url: String,
}

impl HttpStore {
    /// Builds a client reading the bearer token from the environment.
    pub fn from_env(base_url: &str, upload_url: &str) -> Result<Self> {
        let token = env::var(ACCESS_TOKEN_VAR)?;
        Self::with_token(base_url, upload_url, &token)
    }

    pub fn with_token(base_url: &str, upload_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(HttpStore {
            http,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.to_string(),
        })
    }

    /// Maps a failed response to the error taxonomy, parsing the structured
    /// error body when present.
    fn error_for(status: StatusCode, document_id: &str, body: &str) -> FillError {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FillError::Auth(message),
            StatusCode::NOT_FOUND => FillError::DocumentNotFound(document_id.to_string()),
            _ => FillError::Api { status, message },
        }
    }
}

impl PresentationStore for HttpStore {
    fn read(&self, document_id: &str) -> Result<Document> {
        let url = format!("{}/{}", self.base_url, document_id);
        debug!("GET {url}");
        let response = self.http.get(&url).bearer_auth(&self.token).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Self::error_for(status, document_id, &body));
        }
        Ok(response.json()?)
    }

    fn batch_mutate(&self, document_id: &str, ops: &[MutateOp]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{}:batchUpdate", self.base_url, document_id);
        let requests: Vec<Value> = ops.iter().map(MutateOp::to_request).collect();
        info!("applying {} mutation(s) to {document_id}", requests.len());
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "requests": requests }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Self::error_for(status, document_id, &body));
        }
        Ok(())
    }

    fn upload_asset(&self, bytes: &[u8], mime_type: &str) -> Result<AssetRef> {
        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes.to_vec())
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Self::error_for(status, "", &body));
        }
        let parsed: Value = response.json()?;
        let id = parsed
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let url = parsed
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| FillError::InvalidInput("upload response missing url".into()))?
            .to_string();
        Ok(AssetRef { id, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_all_text_wire_shape() {
        let op = MutateOp::ReplaceAllText {
            find: "{{projectName}}".into(),
            replace: "Atlas".into(),
            page_object_ids: vec!["s1".into()],
        };
        let wire = op.to_request();
        assert_eq!(
            wire.pointer("/replaceAllText/containsText/text").unwrap(),
            "{{projectName}}"
        );
        assert_eq!(wire.pointer("/replaceAllText/replaceText").unwrap(), "Atlas");
        assert_eq!(
            wire.pointer("/replaceAllText/containsText/matchCase").unwrap(),
            true
        );
    }

    #[test]
    fn create_image_carries_pt_size_and_transform() {
        let op = MutateOp::CreateImage {
            url: "https://assets.example/a.jpg".into(),
            page_object_id: "s2".into(),
            size: SizePt::new(288.0, 216.0),
            transform: AffineTransform {
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                translate_x: Some(40.0),
                translate_y: Some(60.0),
                ..Default::default()
            },
        };
        let wire = op.to_request();
        let props = wire.pointer("/createImage/elementProperties").unwrap();
        assert_eq!(props.pointer("/size/width/magnitude").unwrap(), 288.0);
        assert_eq!(props.pointer("/size/width/unit").unwrap(), "PT");
        assert_eq!(props.pointer("/transform/scaleX").unwrap(), 1.0);
        assert_eq!(props.pointer("/transform/translateY").unwrap(), 60.0);
    }

    #[test]
    fn update_text_style_masks_only_set_fields() {
        let op = MutateOp::UpdateTextStyle {
            object_id: "e9".into(),
            start_index: 12,
            end_index: 33,
            style: TextStyleUpdate {
                underline: Some(true),
                link_url: Some("https://example.com".into()),
                foreground: Some(Rgb::new(0.0, 0.5, 1.0)),
                ..Default::default()
            },
        };
        let wire = op.to_request();
        let update = wire.pointer("/updateTextStyle").unwrap();
        assert_eq!(update.pointer("/textRange/type").unwrap(), "FIXED_RANGE");
        assert_eq!(update.pointer("/textRange/startIndex").unwrap(), 12);
        assert_eq!(
            update.pointer("/fields").unwrap(),
            "underline,foregroundColor,link"
        );
        assert!(update.pointer("/style/bold").is_none());
    }

    #[test]
    fn empty_style_update_has_empty_mask() {
        assert!(TextStyleUpdate::default().is_empty());
    }
}
