// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Data model shared by the widget, the client and the renderers

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::{PredictorError, Result};

/// A file supplied by the user through the picker or a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mime = image::ImageFormat::from_path(path)
            .ok()
            .or_else(|| image::guess_format(&bytes).ok())
            .map(|f| f.to_mime_type().to_string());

        Ok(Self { name, mime, bytes })
    }

    /// MIME type to send, falling back to content sniffing
    pub fn content_type(&self) -> String {
        self.mime
            .clone()
            .or_else(|| {
                image::guess_format(&self.bytes)
                    .ok()
                    .map(|f| f.to_mime_type().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// One labelled classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(deserialize_with = "verbatim")]
    pub label: String,
    #[serde(deserialize_with = "verbatim")]
    pub confidence: String,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.into(),
        }
    }
}

/// Keep strings as-is and anything else as its JSON text, so `0.97` stays `0.97`
fn verbatim<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Body of a `/predict` reply, exactly one shape per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictResponse {
    Predictions(Vec<Prediction>),
    Error {
        error: String,
        details: Option<String>,
    },
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    predictions: Option<Vec<Prediction>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Text of a field that is set. `null`, `false`, `0` and `""` count as unset.
fn present_text(value: Option<serde_json::Value>) -> Option<String> {
    use serde_json::Value;

    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl PredictResponse {
    /// Parse a response body.
    ///
    /// A set `error` field wins over `predictions`. `error` and `details`
    /// may be any JSON value; non-strings are shown as JSON text. A body with
    /// neither field is malformed.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let wire: WireResponse = serde_json::from_slice(body)?;

        if let Some(error) = present_text(wire.error) {
            let details = present_text(wire.details);
            return Ok(PredictResponse::Error { error, details });
        }

        match wire.predictions {
            Some(predictions) => Ok(PredictResponse::Predictions(predictions)),
            None => Err(PredictorError::MalformedResponse(
                "response has neither 'predictions' nor 'error'".to_string(),
            )),
        }
    }

    /// Entries to display for this response
    pub fn into_entries(self) -> Vec<ResultEntry> {
        match self {
            PredictResponse::Predictions(predictions) => predictions
                .into_iter()
                .map(|p| ResultEntry::Prediction {
                    label: p.label,
                    confidence: p.confidence,
                })
                .collect(),
            PredictResponse::Error { error, details } => vec![ResultEntry::Error {
                message: details.unwrap_or(error),
            }],
        }
    }
}

/// One row of the result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultEntry {
    Analyzing { message: String },
    Prediction { label: String, confidence: String },
    Error { message: String },
}

impl ResultEntry {
    pub fn is_error(&self) -> bool {
        matches!(self, ResultEntry::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictions_keep_order_and_text() {
        let body = br#"{"predictions":[
            {"label":"Tomato___Late_blight","confidence":"97.12%"},
            {"label":"Cat","confidence":"0.5"},
            {"label":"Cat","confidence":"2%"}
        ]}"#;

        let entries = PredictResponse::from_slice(body).unwrap().into_entries();
        assert_eq!(
            entries,
            vec![
                ResultEntry::Prediction { label: "Tomato___Late_blight".into(), confidence: "97.12%".into() },
                ResultEntry::Prediction { label: "Cat".into(), confidence: "0.5".into() },
                ResultEntry::Prediction { label: "Cat".into(), confidence: "2%".into() },
            ]
        );
    }

    #[test]
    fn test_empty_predictions() {
        let response = PredictResponse::from_slice(br#"{"predictions":[]}"#).unwrap();
        assert!(response.into_entries().is_empty());
    }

    #[test]
    fn test_numeric_confidence_is_kept_verbatim() {
        let response = PredictResponse::from_slice(
            br#"{"predictions":[{"label":"Dog","confidence":0.8125}]}"#,
        ).unwrap();
        assert_eq!(
            response,
            PredictResponse::Predictions(vec![Prediction::new("Dog", "0.8125")])
        );
    }

    #[test]
    fn test_details_preferred_over_error() {
        let response = PredictResponse::from_slice(
            br#"{"error":"bad_image","details":"Unsupported format"}"#,
        ).unwrap();
        assert_eq!(
            response.into_entries(),
            vec![ResultEntry::Error { message: "Unsupported format".into() }]
        );
    }

    #[test]
    fn test_error_without_details() {
        let response = PredictResponse::from_slice(br#"{"error":"No file part in the request"}"#).unwrap();
        assert_eq!(
            response.into_entries(),
            vec![ResultEntry::Error { message: "No file part in the request".into() }]
        );
    }

    #[test]
    fn test_empty_details_falls_back_to_error() {
        let response = PredictResponse::from_slice(br#"{"error":"boom","details":""}"#).unwrap();
        assert_eq!(
            response,
            PredictResponse::Error { error: "boom".into(), details: None }
        );
    }

    #[test]
    fn test_numeric_error_is_shown() {
        let response = PredictResponse::from_slice(
            br#"{"error":404,"details":"Model not loaded"}"#,
        ).unwrap();
        assert_eq!(
            response.into_entries(),
            vec![ResultEntry::Error { message: "Model not loaded".into() }]
        );

        let response = PredictResponse::from_slice(br#"{"error":404}"#).unwrap();
        assert_eq!(
            response.into_entries(),
            vec![ResultEntry::Error { message: "404".into() }]
        );
    }

    #[test]
    fn test_unset_error_values_fall_through_to_predictions() {
        for body in [
            br#"{"error":null,"predictions":[]}"#.as_slice(),
            br#"{"error":false,"predictions":[]}"#.as_slice(),
            br#"{"error":0,"predictions":[]}"#.as_slice(),
            br#"{"error":"","predictions":[]}"#.as_slice(),
        ] {
            let response = PredictResponse::from_slice(body).unwrap();
            assert_eq!(response, PredictResponse::Predictions(Vec::new()));
        }
    }

    #[test]
    fn test_structured_details_shown_as_json() {
        let response = PredictResponse::from_slice(
            br#"{"error":"bad_image","details":{"code":7},"predictions":null}"#,
        ).unwrap();
        assert_eq!(
            response.into_entries(),
            vec![ResultEntry::Error { message: r#"{"code":7}"#.into() }]
        );
    }

    #[test]
    fn test_error_wins_over_predictions() {
        let response = PredictResponse::from_slice(
            br#"{"error":"nope","predictions":[{"label":"Cat","confidence":"1%"}]}"#,
        ).unwrap();
        assert!(matches!(response, PredictResponse::Error { .. }));
    }

    #[test]
    fn test_body_without_either_field_is_malformed() {
        let err = PredictResponse::from_slice(br#"{"status":"ok"}"#).unwrap_err();
        assert!(matches!(err, PredictorError::MalformedResponse(_)));
        assert!(err.is_transport_failure());
    }

    #[test]
    fn test_non_json_body_is_transport_failure() {
        let err = PredictResponse::from_slice(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(err.is_transport_failure());
    }

    #[test]
    fn test_content_type_sniffs_png() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let file = SelectedFile::new("leaf", None, png.to_vec());
        assert_eq!(file.content_type(), "image/png");

        let unknown = SelectedFile::new("blob", None, vec![1, 2, 3]);
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }

    #[test]
    fn test_from_path_reads_name_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let file = tokio_test::block_on(SelectedFile::from_path(&path)).unwrap();
        assert_eq!(file.name, "cat.jpg");
        assert_eq!(file.mime.as_deref(), Some("image/jpeg"));
        assert_eq!(file.bytes, b"not really a jpeg");
    }
}
