//! Catalog endpoint client and payload normalization.
//!
//! All three catalog endpoints wrap their payload in a `{ code, data }`
//! envelope and are treated as eventually-consistent, cacheable, idempotent
//! reads. Normalization turns the loosely-shaped upstream model record into
//! a [`ModelDetail`] the schema parser can consume directly; everything the
//! parser does not need is dropped here.

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use wavespeed_api::{Service, WaveSpeedClient};
use wavespeed_types::{Category, ModelDetail, ModelSummary};
use wavespeed_util::names::category_display_name;

const MODELS_PAGE_SIZE: u32 = 100;

/// Errors emitted by catalog reads.
///
/// Callers at the UI boundary degrade these to empty results with a status
/// badge; nothing here propagates to the host as an exception.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level failure or non-success HTTP status.
    #[error("catalog request failed: {0}")]
    Transport(String),
    /// The endpoint answered, but the envelope signalled an error.
    #[error("catalog API error code {code}: {message}")]
    Envelope { code: i64, message: String },
    /// The requested model does not exist.
    #[error("model '{0}' not found")]
    NotFound(String),
    /// The model record exists but carries no usable request schema.
    #[error("no valid request schema found for model '{0}'")]
    MissingSchema(String),
    /// The payload did not have the expected shape.
    #[error("unexpected catalog payload: {0}")]
    InvalidPayload(String),
}

/// Read-only catalog surface, mockable for tests and for offline preloads.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists categories that currently have at least one published model.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;
    /// Lists the models published under `category`.
    async fn list_models(&self, category: &str) -> Result<Vec<ModelSummary>, CatalogError>;
    /// Fetches and normalizes the detail record for `model_id`.
    async fn model_detail(&self, model_id: &str) -> Result<ModelDetail, CatalogError>;
}

/// HTTP implementation backed by [`WaveSpeedClient`].
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: WaveSpeedClient,
}

impl HttpCatalogClient {
    /// Builds a client against the catalog service base URL. The catalog
    /// surface is unauthenticated.
    pub fn new() -> Result<Self, CatalogError> {
        let client = WaveSpeedClient::new_for_service(Service::Catalog, None)
            .map_err(|error| CatalogError::Transport(error.to_string()))?;
        Ok(Self { client })
    }

    async fn get_enveloped(&self, path: &str) -> Result<Value, CatalogError> {
        let response = self
            .client
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|error| CatalogError::Transport(error.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| CatalogError::InvalidPayload(error.to_string()))?;
        unwrap_envelope(body)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let data = self.get_enveloped("/model_product/type_statistics").await?;
        Ok(parse_categories(&data))
    }

    async fn list_models(&self, category: &str) -> Result<Vec<ModelSummary>, CatalogError> {
        let path = format!("/model_product/search?page=1&page_size={MODELS_PAGE_SIZE}&types={category}");
        let data = self.get_enveloped(&path).await?;
        Ok(parse_models(&data))
    }

    async fn model_detail(&self, model_id: &str) -> Result<ModelDetail, CatalogError> {
        let normalized_id = normalize_model_id(model_id);
        debug!(model_id = %normalized_id, "fetching model detail");
        let data = self.get_enveloped(&format!("/model_product/detail/{normalized_id}")).await?;
        normalize_model_detail(&data)
    }
}

/// Unwraps the `{ code, data }` envelope shared by all catalog endpoints.
pub fn unwrap_envelope(body: Value) -> Result<Value, CatalogError> {
    let code = body.get("code").and_then(Value::as_i64).unwrap_or(-1);
    if code != 200 {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown API error")
            .to_string();
        return Err(CatalogError::Envelope { code, message });
    }
    body.get("data")
        .cloned()
        .ok_or_else(|| CatalogError::InvalidPayload("envelope has no data".into()))
}

/// Converts the `type_statistics` payload, keeping only categories that
/// currently have models.
pub fn parse_categories(data: &Value) -> Vec<Category> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let type_name = item.get("type").and_then(Value::as_str)?;
            let count = item.get("count").and_then(Value::as_u64).unwrap_or(0);
            (count > 0).then(|| Category {
                value: type_name.to_string(),
                name: category_display_name(type_name),
                count,
            })
        })
        .collect()
}

/// Converts a category search payload into model rows.
pub fn parse_models(data: &Value) -> Vec<ModelSummary> {
    let Some(items) = data.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|model| {
            let value = model.get("model_uuid").and_then(Value::as_str)?;
            let name = model.get("model_name").and_then(Value::as_str).unwrap_or(value);
            Some(ModelSummary {
                value: value.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// Decodes a model id that may arrive percent-encoded or wrapped in
/// slashes.
pub fn normalize_model_id(model_id: &str) -> String {
    let decoded = percent_decode_str(model_id).decode_utf8_lossy();
    decoded.trim_matches('/').to_string()
}

/// Normalizes a raw model record into [`ModelDetail`].
///
/// The input schema may arrive three ways: as an `input` JSON string, as an
/// `input` object, or buried in the `model_run` entry of
/// `api_schema.api_schemas`. The api path comes from the first schema entry
/// and defaults to `/api/v3/<model_uuid>`.
pub fn normalize_model_detail(record: &Value) -> Result<ModelDetail, CatalogError> {
    let model_uuid = record
        .get("model_uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::InvalidPayload("model record is missing model_uuid".into()))?;
    let model_name = record
        .get("model_name")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::InvalidPayload("model record is missing model_name".into()))?;

    let input_schema = extract_input_schema(record)
        .ok_or_else(|| CatalogError::MissingSchema(model_uuid.to_string()))?;

    let api_path = record
        .get("api_schema")
        .and_then(|schema| schema.get("api_schemas"))
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("api_path"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("/api/v3/{model_uuid}"));

    let description = record
        .get("description")
        .and_then(Value::as_str)
        .or_else(|| record.get("readme").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    Ok(ModelDetail {
        id: model_uuid.to_string(),
        name: model_name.to_string(),
        description,
        category: record.get("type").and_then(Value::as_str).unwrap_or("unknown").to_string(),
        model_uuid: model_uuid.to_string(),
        api_path,
        input_schema,
    })
}

fn extract_input_schema(record: &Value) -> Option<Value> {
    match record.get("input") {
        Some(Value::String(raw)) if !raw.trim().is_empty() => match serde_json::from_str(raw) {
            Ok(parsed) => return Some(parsed),
            Err(error) => {
                warn!(%error, "model input field is not valid JSON; falling back to api_schema");
            }
        },
        Some(Value::Object(fields)) if !fields.is_empty() => return Some(Value::Object(fields.clone())),
        _ => {}
    }

    let entries = record.get("api_schema")?.get("api_schemas")?.as_array()?;
    let model_run = entries
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("model_run"))
        .or_else(|| entries.first())?;
    model_run.get("request_schema").cloned()
}
