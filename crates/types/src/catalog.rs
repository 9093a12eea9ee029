//! Catalog and upload item types.
//!
//! These mirror the payloads of the three read-only catalog endpoints and
//! the media upload endpoint. All are eventually-consistent, cacheable
//! reads; the client normalizes the upstream envelope before these types
//! are constructed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One model category ("text-to-image", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category key used in catalog requests.
    pub value: String,
    /// Human-readable category name.
    pub name: String,
    /// Number of models currently published under the category.
    #[serde(default)]
    pub count: u64,
}

/// One model row inside a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Catalog identifier (model UUID).
    pub value: String,
    /// Display name.
    pub name: String,
}

/// Normalized model detail, the input to schema parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetail {
    /// Catalog identifier, equal to `model_uuid`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description or readme excerpt, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Category key the model is published under.
    #[serde(default)]
    pub category: String,
    /// Upstream model UUID.
    pub model_uuid: String,
    /// API path generation requests are submitted to.
    pub api_path: String,
    /// Raw input schema document for the parser.
    pub input_schema: Value,
}

/// Discriminator for binary upload payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    /// A file picked from the local machine.
    LocalFile,
    /// Host-produced media handed over as encoded bytes.
    Tensor,
}

impl UploadKind {
    /// Wire value of the discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::LocalFile => "local_file",
            UploadKind::Tensor => "tensor",
        }
    }
}

/// Payload accepted by the upload operation.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPayload {
    /// An already-hosted URL; passed through without any network call.
    UrlReference {
        /// The URL to hand back verbatim.
        url: String,
    },
    /// Raw bytes to push to the media endpoint.
    Binary {
        /// Payload discriminator.
        kind: UploadKind,
        /// Filename reported to the endpoint.
        filename: String,
        /// MIME type of the bytes.
        content_type: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Successful upload result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// Public URL of the uploaded media (or the passed-through reference).
    pub url: String,
    /// Original filename for binary uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_count_defaults_to_zero() {
        let category: Category = serde_json::from_value(json!({ "value": "text-to-image", "name": "Text to Image" }))
            .expect("deserialize category");
        assert_eq!(category.count, 0);
    }

    #[test]
    fn upload_kind_wire_values_match_the_endpoint_contract() {
        assert_eq!(UploadKind::LocalFile.as_str(), "local_file");
        assert_eq!(UploadKind::Tensor.as_str(), "tensor");
    }
}
