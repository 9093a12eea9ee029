//! Model-picker search.
//!
//! The controller ranks the preloaded catalog with the fuzzy matcher and
//! resolves a selection to a normalized model detail, caching details under
//! `detail_<model_id>`. It also implements the engine's
//! [`SchemaProvider`] so the restore path can re-fetch a saved model's
//! schema through the same cache.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use wavespeed_engine::SchemaProvider;
use wavespeed_types::{ModelDetail, ModelSummary};
use wavespeed_util::fuzzy::fuzzy_match;

use crate::cache::CacheStore;
use crate::client::{CatalogClient, CatalogError};
use crate::preload::PreloadedCatalog;

/// Cache key prefix of normalized model details.
pub const DETAIL_CACHE_PREFIX: &str = "detail_";

/// One row of the ranked picker list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedModel {
    /// The matched model.
    pub model: ModelSummary,
    /// Category the model is listed under.
    pub category: String,
    /// Best fuzzy score across the candidate fields.
    pub score: f64,
    /// Matched character positions of the best-scoring field, for
    /// highlighting.
    pub positions: Vec<usize>,
}

/// Drives the model picker: holds the preloaded catalog, ranks it against
/// the query, and resolves selections to model details.
pub struct CatalogSearchController {
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn CacheStore>,
    catalog: Mutex<PreloadedCatalog>,
}

impl CatalogSearchController {
    pub fn new(client: Arc<dyn CatalogClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            cache,
            catalog: Mutex::new(PreloadedCatalog::default()),
        }
    }

    /// Installs a freshly preloaded catalog snapshot.
    pub fn set_catalog(&self, catalog: PreloadedCatalog) {
        if let Ok(mut guard) = self.catalog.lock() {
            *guard = catalog;
        }
    }

    /// Every model in catalog order, for the empty-query picker view.
    pub fn all_models(&self) -> Vec<RankedModel> {
        let catalog = match self.catalog.lock() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut rows = Vec::new();
        for category in &catalog.categories {
            if let Some(models) = catalog.models_by_category.get(&category.value) {
                for model in models {
                    rows.push(RankedModel {
                        model: model.clone(),
                        category: category.value.clone(),
                        score: 0.0,
                        positions: Vec::new(),
                    });
                }
            }
        }
        rows
    }

    /// Ranks the catalog against `query`.
    ///
    /// Each model is scored as the maximum of its display name, its
    /// identifier, and its category name; zero-score models are discarded;
    /// the rest sort descending by score with ties keeping their original
    /// catalog order (stable sort).
    pub fn search(&self, query: &str) -> Vec<RankedModel> {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return Vec::new();
        }

        let catalog = match self.catalog.lock() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };

        let mut ranked = Vec::new();
        for category in &catalog.categories {
            let Some(models) = catalog.models_by_category.get(&category.value) else {
                continue;
            };
            for model in models {
                let mut best = fuzzy_match(trimmed_query, &model.name);
                for candidate in [model.value.as_str(), category.name.as_str()] {
                    let result = fuzzy_match(trimmed_query, candidate);
                    if result.score > best.score {
                        best = result;
                    }
                }
                if !best.is_match() {
                    continue;
                }
                ranked.push(RankedModel {
                    model: model.clone(),
                    category: category.value.clone(),
                    score: best.score,
                    positions: best.positions,
                });
            }
        }

        ranked.sort_by(|left, right| right.score.partial_cmp(&left.score).unwrap_or(Ordering::Equal));
        ranked
    }

    /// Resolves a picked model to its normalized detail, via the cache.
    pub async fn select(&self, model_id: &str) -> Result<ModelDetail, CatalogError> {
        let cache_key = format!("{DETAIL_CACHE_PREFIX}{model_id}");
        if let Some(cached) = self.cache.get(&cache_key) {
            match serde_json::from_value::<ModelDetail>(cached) {
                Ok(detail) => return Ok(detail),
                Err(error) => debug!(model_id, %error, "cached detail unreadable; refetching"),
            }
        }

        let detail = self.client.model_detail(model_id).await?;
        if let Ok(serialized) = serde_json::to_value(&detail) {
            self.cache.set(&cache_key, serialized);
        }
        Ok(detail)
    }
}

#[async_trait]
impl SchemaProvider for CatalogSearchController {
    async fn fetch_schema(&self, model_id: &str) -> anyhow::Result<Value> {
        let detail = self.select(model_id).await?;
        Ok(detail.input_schema)
    }
}
