//! Request and response payloads of the template and contract endpoints.
//! Binary documents travel base64-encoded inside JSON.

use crate::model::form_field::FormField;
use crate::model::markup::StructuredDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default, alias = "fileBytes")]
    pub file_base64: Option<String>,
    #[serde(default)]
    pub markup_html: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Stored form, placeholders as `{{key}}`.
    #[serde(default)]
    pub markup_html: Option<String>,
    /// Editor form, placeholders as `data-merge` spans.
    #[serde(default)]
    pub editor_html: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRequest {
    #[serde(alias = "fileBytes")]
    pub file_base64: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFieldsRequest {
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Literal lines stamped top-to-bottom on the first page.
    #[serde(default)]
    pub free_text: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub project_id: String,
    pub client_name: String,
    pub title: String,
    pub value: i64,
    pub wedding_date: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub package_type: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

/// A signature as submitted by the signing page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SignatureInput {
    /// A ready-made PNG, optionally as a `data:image/png;base64,` URL.
    #[serde(rename_all = "camelCase")]
    Image { png_base64: String },
    /// Pen strokes in signature-pad canvas coordinates.
    Strokes { strokes: Vec<Vec<StrokePoint>> },
    /// A typed full name.
    Typed { name: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignClientRequest {
    pub token: String,
    pub signature: SignatureInput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignVendorRequest {
    pub signature: SignatureInput,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignInfoQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub id: String,
    pub paragraphs: usize,
    /// Set when no text could be recovered and a placeholder paragraph was used.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableResponse {
    pub document: StructuredDocument,
    pub editor_html: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentResponse {
    pub sign_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSignedResponse {
    pub client_signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSignedResponse {
    pub signed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_inputs_are_tagged_by_kind() {
        let typed: SignatureInput =
            serde_json::from_str(r#"{"kind":"typed","name":"Ada"}"#).unwrap();
        assert!(matches!(typed, SignatureInput::Typed { ref name } if name == "Ada"));

        let image: SignatureInput =
            serde_json::from_str(r#"{"kind":"image","pngBase64":"AAAA"}"#).unwrap();
        assert!(matches!(image, SignatureInput::Image { .. }));

        let strokes: SignatureInput = serde_json::from_str(
            r#"{"kind":"strokes","strokes":[[{"x":1,"y":2},{"x":3.5,"y":4}]]}"#,
        )
        .unwrap();
        match strokes {
            SignatureInput::Strokes { strokes } => assert_eq!(strokes[0].len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn file_payloads_accept_both_field_names() {
        let a: FileUploadRequest = serde_json::from_str(r#"{"fileBase64":"QQ=="}"#).unwrap();
        let b: FileUploadRequest = serde_json::from_str(r#"{"fileBytes":"QQ=="}"#).unwrap();
        assert_eq!(a.file_base64, b.file_base64);
    }
}
