//! Invocation request/response handling — the HTTP boundary, not the core.
//!
//! Validation is deliberately manual rather than `#[derive(Deserialize)]`:
//! the function's contract promises itemized error messages ("missing
//! content at index 3", plus the keys that *were* present), which a derive
//! would collapse into one opaque serde error. Every decoded payload is
//! checked for the `%PDF` signature before any processing happens.

use crate::error::SourceError;
use crate::output::MergeOutput;
use crate::pipeline::input::{self, SourceFile};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Filename reported for the merged document.
pub const OUTPUT_FILENAME: &str = "merged_receipts.pdf";

/// A request-shape violation. Every variant maps to an HTTP status and a
/// structured JSON body via [`RequestError::status`] and
/// [`RequestError::to_json`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    #[error("Method not allowed. Use POST. Current method: {method}")]
    MethodNotAllowed { method: String },

    #[error("No request body found")]
    EmptyBody,

    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    #[error("Request body must be a JSON object")]
    BodyNotObject,

    #[error("Field \"files\" is required. Provide array of base64 encoded PDF files.")]
    MissingFiles { received_keys: Vec<String> },

    #[error("Files must be an array")]
    FilesNotArray,

    #[error("Files array cannot be empty")]
    FilesEmpty,

    #[error("Invalid file data at index {index}. Expected object.")]
    EntryNotObject { index: usize },

    #[error("Missing \"content\" field in file at index {index}")]
    MissingContent {
        index: usize,
        available_keys: Vec<String>,
    },

    #[error("Failed to decode file at index {index}: {detail}")]
    InvalidBase64 { index: usize, detail: String },

    #[error("File at index {index} is not a valid PDF")]
    NotAPdf { index: usize },
}

impl RequestError {
    /// HTTP status for this rejection.
    pub fn status(&self) -> u16 {
        match self {
            RequestError::MethodNotAllowed { .. } => 405,
            _ => 400,
        }
    }

    /// The error body, with the itemized context the contract promises.
    pub fn to_json(&self) -> Value {
        let mut body = json!({ "error": self.to_string() });
        match self {
            RequestError::MissingFiles { received_keys } => {
                body["received_keys"] = json!(received_keys);
            }
            RequestError::MissingContent { available_keys, .. } => {
                body["available_keys"] = json!(available_keys);
            }
            _ => {}
        }
        body
    }
}

/// Parse and validate a raw invocation body into decoded sources.
pub fn parse_request(body: &[u8]) -> Result<Vec<SourceFile>, RequestError> {
    if body.is_empty() {
        return Err(RequestError::EmptyBody);
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RequestError::InvalidJson(e.to_string()))?;
    parse_request_value(&value)
}

/// Validate an already-parsed JSON body.
pub fn parse_request_value(value: &Value) -> Result<Vec<SourceFile>, RequestError> {
    let object = value.as_object().ok_or(RequestError::BodyNotObject)?;

    let files = object.get("files").ok_or_else(|| RequestError::MissingFiles {
        received_keys: object.keys().cloned().collect(),
    })?;
    let entries = files.as_array().ok_or(RequestError::FilesNotArray)?;
    if entries.is_empty() {
        return Err(RequestError::FilesEmpty);
    }

    let mut sources = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry = entry
            .as_object()
            .ok_or(RequestError::EntryNotObject { index })?;

        let content = entry
            .get("content")
            .ok_or_else(|| RequestError::MissingContent {
                index,
                available_keys: entry.keys().cloned().collect(),
            })?;
        let content = content.as_str().ok_or_else(|| RequestError::InvalidBase64 {
            index,
            detail: "content must be a base64 string".into(),
        })?;

        let bytes = BASE64
            .decode(content.trim())
            .map_err(|e| RequestError::InvalidBase64 {
                index,
                detail: e.to_string(),
            })?;
        if !input::has_pdf_magic(&bytes) {
            return Err(RequestError::NotAPdf { index });
        }

        let filename = normalize_filename(entry.get("filename").and_then(Value::as_str), index);
        sources.push(SourceFile { filename, bytes });
    }

    Ok(sources)
}

/// Default a missing name and normalise the suffix to `.pdf`.
fn normalize_filename(raw: Option<&str>, index: usize) -> String {
    let name = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("file_{index}.pdf"));

    if name.to_ascii_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{name}.pdf")
    }
}

/// The merged document as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedFile {
    pub filename: String,
    /// Base64-encoded PDF bytes.
    pub content: String,
    /// Decoded size in bytes.
    pub size: usize,
}

/// The invocation success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResponse {
    pub success: bool,
    pub message: String,
    pub file: MergedFile,
    /// Skipped-source diagnostics; empty on a clean merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SourceError>,
}

/// Build the success body for a finished merge.
pub fn success_response(output: &MergeOutput) -> MergeResponse {
    MergeResponse {
        success: true,
        message: format!("Successfully merged {} PDFs", output.stats.total_sources),
        file: MergedFile {
            filename: OUTPUT_FILENAME.to_string(),
            content: BASE64.encode(&output.pdf),
            size: output.pdf.len(),
        },
        skipped: output.skipped.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(content: &str) -> Value {
        json!({ "files": [{ "filename": "r.pdf", "content": content }] })
    }

    #[test]
    fn valid_request_decodes() {
        let body = payload(&BASE64.encode(b"%PDF-1.4 tiny"));
        let sources = parse_request_value(&body).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].filename, "r.pdf");
        assert_eq!(sources[0].bytes, b"%PDF-1.4 tiny");
    }

    #[test]
    fn empty_body_and_bad_json() {
        assert_eq!(parse_request(b"").unwrap_err(), RequestError::EmptyBody);
        assert!(matches!(
            parse_request(b"{not json").unwrap_err(),
            RequestError::InvalidJson(_)
        ));
    }

    #[test]
    fn non_object_body() {
        assert_eq!(
            parse_request_value(&json!([1, 2])).unwrap_err(),
            RequestError::BodyNotObject
        );
    }

    #[test]
    fn missing_files_reports_received_keys() {
        let err = parse_request_value(&json!({ "documents": [] })).unwrap_err();
        match &err {
            RequestError::MissingFiles { received_keys } => {
                assert_eq!(received_keys, &["documents".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_json()["received_keys"], json!(["documents"]));
    }

    #[test]
    fn files_must_be_nonempty_array() {
        assert_eq!(
            parse_request_value(&json!({ "files": "x" })).unwrap_err(),
            RequestError::FilesNotArray
        );
        assert_eq!(
            parse_request_value(&json!({ "files": [] })).unwrap_err(),
            RequestError::FilesEmpty
        );
    }

    #[test]
    fn missing_content_reports_available_keys() {
        let err =
            parse_request_value(&json!({ "files": [{ "filename": "a.pdf" }] })).unwrap_err();
        match err {
            RequestError::MissingContent {
                index,
                available_keys,
            } => {
                assert_eq!(index, 0);
                assert_eq!(available_keys, vec!["filename".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bad_base64_is_rejected() {
        let err = parse_request_value(&payload("!!not-base64!!")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidBase64 { index: 0, .. }));
    }

    #[test]
    fn non_pdf_payload_is_rejected_before_processing() {
        let err = parse_request_value(&payload(&BASE64.encode(b"PK zip archive"))).unwrap_err();
        assert_eq!(err, RequestError::NotAPdf { index: 0 });
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn second_bad_entry_is_indexed() {
        let body = json!({ "files": [
            { "content": BASE64.encode(b"%PDF-1.4 ok") },
            { "content": BASE64.encode(b"not a pdf") },
        ]});
        assert_eq!(
            parse_request_value(&body).unwrap_err(),
            RequestError::NotAPdf { index: 1 }
        );
    }

    #[test]
    fn filename_defaults_and_suffix() {
        assert_eq!(normalize_filename(None, 3), "file_3.pdf");
        assert_eq!(normalize_filename(Some(""), 0), "file_0.pdf");
        assert_eq!(normalize_filename(Some("scan"), 0), "scan.pdf");
        assert_eq!(normalize_filename(Some("scan.PDF"), 0), "scan.PDF");
        assert_eq!(normalize_filename(Some("scan.pdf"), 0), "scan.pdf");
    }

    #[test]
    fn method_not_allowed_is_405() {
        let err = RequestError::MethodNotAllowed {
            method: "GET".into(),
        };
        assert_eq!(err.status(), 405);
        assert!(err.to_string().contains("GET"));
    }

    #[test]
    fn success_body_shape() {
        use crate::output::{MergeStats, MergeOutput};

        let output = MergeOutput {
            pdf: b"%PDF-1.4 merged".to_vec(),
            stats: MergeStats {
                total_sources: 2,
                merged_sources: 2,
                skipped_sources: 0,
                pages: 1,
                fallback_used: false,
                total_duration_ms: 5,
            },
            skipped: Vec::new(),
        };
        let resp = success_response(&output);
        assert!(resp.success);
        assert_eq!(resp.message, "Successfully merged 2 PDFs");
        assert_eq!(resp.file.filename, OUTPUT_FILENAME);
        assert_eq!(resp.file.size, output.pdf.len());
        assert_eq!(BASE64.decode(&resp.file.content).unwrap(), output.pdf);

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], json!(true));
        assert!(value.get("skipped").is_none());
    }
}
