//! Media upload.
//!
//! A field holding media content accepts either an already-hosted URL
//! (passed through untouched) or raw bytes that are pushed to the platform
//! upload endpoint as multipart form data with bearer auth. Failures come
//! back as an [`UploadError`] value the field UI reports inline and
//! auto-dismisses; nothing here panics or propagates across the component
//! boundary.

use std::time::Duration;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use wavespeed_api::{Service, WaveSpeedClient};
use wavespeed_types::{UploadOutcome, UploadPayload};

use crate::config::effective_api_key;

const UPLOAD_PATH: &str = "/api/v3/media/upload/binary";
/// Uploads move real media; they get a far longer budget than catalog reads.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(180);

/// Inline, per-field upload failure.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No key in any source; the settings surface must be used first.
    #[error("no API key configured; add your WaveSpeed API key in Settings")]
    MissingApiKey,
    /// The request never produced a usable response.
    #[error("upload request failed: {0}")]
    Transport(String),
    /// The endpoint rejected the upload.
    #[error("upload failed: HTTP {0}")]
    Status(u16),
    /// The endpoint accepted the upload but returned no usable URL.
    #[error("no download URL in upload response")]
    MissingUrl,
    /// The payload cannot be uploaded as given.
    #[error("invalid upload request: {0}")]
    InvalidPayload(String),
}

/// Uploads `payload` and returns the public URL to put into the field.
///
/// URL references pass through without a network call.
pub async fn upload_media(payload: UploadPayload) -> Result<UploadOutcome, UploadError> {
    match payload {
        UploadPayload::UrlReference { url } => {
            let trimmed = url.trim().to_string();
            if trimmed.is_empty() {
                return Err(UploadError::InvalidPayload("empty URL reference".into()));
            }
            Ok(UploadOutcome {
                url: trimmed,
                filename: None,
            })
        }
        UploadPayload::Binary {
            kind,
            filename,
            content_type,
            bytes,
        } => {
            if bytes.is_empty() {
                return Err(UploadError::InvalidPayload("missing file data".into()));
            }
            let api_key = effective_api_key().ok_or(UploadError::MissingApiKey)?;
            let client = WaveSpeedClient::new_for_service(Service::Platform, Some(&api_key))
                .map_err(|error| UploadError::Transport(error.to_string()))?;

            debug!(kind = kind.as_str(), filename = %filename, size = bytes.len(), "uploading media");

            let part = Part::bytes(bytes)
                .file_name(filename.clone())
                .mime_str(&content_type)
                .map_err(|error| UploadError::InvalidPayload(format!("bad content type: {error}")))?;
            let form = Form::new().part("file", part);

            let response = client
                .request(Method::POST, UPLOAD_PATH)
                .timeout(UPLOAD_TIMEOUT)
                .multipart(form)
                .send()
                .await
                .map_err(|error| UploadError::Transport(error.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(status = status.as_u16(), "upload rejected");
                return Err(UploadError::Status(status.as_u16()));
            }

            let body: Value = response
                .json()
                .await
                .map_err(|error| UploadError::Transport(format!("unparseable upload response: {error}")))?;
            let url = extract_download_url(&body).ok_or(UploadError::MissingUrl)?;

            Ok(UploadOutcome {
                url,
                filename: Some(filename),
            })
        }
    }
}

/// Pulls the public URL out of the upload response, which has shipped in
/// several shapes over time: a bare string, `{download_url}`, `{url}`, or
/// `{data: {download_url}}`.
pub fn extract_download_url(body: &Value) -> Option<String> {
    if let Some(url) = body.as_str() {
        return Some(url.to_string());
    }
    for direct_key in ["download_url", "url"] {
        if let Some(url) = body.get(direct_key).and_then(Value::as_str) {
            return Some(url.to_string());
        }
    }
    body.get("data")
        .and_then(|data| data.get("download_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wavespeed_types::UploadKind;

    #[tokio::test]
    async fn url_references_pass_through_without_network() {
        let outcome = upload_media(UploadPayload::UrlReference {
            url: " https://cdn.example.com/cat.png ".into(),
        })
        .await
        .expect("passthrough succeeds");

        assert_eq!(outcome.url, "https://cdn.example.com/cat.png");
        assert_eq!(outcome.filename, None);
    }

    #[tokio::test]
    async fn empty_url_reference_is_invalid() {
        let error = upload_media(UploadPayload::UrlReference { url: "  ".into() })
            .await
            .expect_err("empty reference rejected");
        assert!(matches!(error, UploadError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn empty_binary_payload_is_invalid() {
        let error = upload_media(UploadPayload::Binary {
            kind: UploadKind::LocalFile,
            filename: "empty.png".into(),
            content_type: "image/png".into(),
            bytes: Vec::new(),
        })
        .await
        .expect_err("empty payload rejected");
        assert!(matches!(error, UploadError::InvalidPayload(_)));
    }

    #[test]
    fn download_url_is_found_across_response_shapes() {
        assert_eq!(
            extract_download_url(&json!("https://cdn.example.com/a.png")).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(
            extract_download_url(&json!({ "download_url": "https://cdn.example.com/b.png" })).as_deref(),
            Some("https://cdn.example.com/b.png")
        );
        assert_eq!(
            extract_download_url(&json!({ "url": "https://cdn.example.com/c.png" })).as_deref(),
            Some("https://cdn.example.com/c.png")
        );
        assert_eq!(
            extract_download_url(&json!({ "data": { "download_url": "https://cdn.example.com/d.png" } })).as_deref(),
            Some("https://cdn.example.com/d.png")
        );
        assert_eq!(extract_download_url(&json!({ "unrelated": true })), None);
    }
}
