//! Catalog preload: fan-out, fan-in, coalescing.
//!
//! Preloading fetches the category list and then every per-category model
//! list in parallel, joined as a unit under one bounded timeout. Consumers
//! never observe a partially-joined result: the preloader hands back a
//! complete [`PreloadedCatalog`] in which categories whose fetch had not
//! settled at the deadline are present but empty. Concurrent callers during
//! an active preload share the same pending result instead of issuing
//! duplicate fetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, join_all};
use indexmap::IndexMap;
use serde_json::json;
use tracing::warn;
use wavespeed_types::{Category, ModelSummary};

use crate::cache::CacheStore;
use crate::client::CatalogClient;

/// Upper bound on the whole preload join.
const PRELOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache key of the category list.
pub const CATEGORIES_CACHE_KEY: &str = "categories";
/// Cache key prefix of per-category model lists.
pub const MODELS_CACHE_PREFIX: &str = "models_";

/// Fully-joined catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct PreloadedCatalog {
    /// Categories with at least one published model, in catalog order.
    pub categories: Vec<Category>,
    /// Model rows per category, keyed by category value. Every category in
    /// `categories` has an entry; unsettled fetches leave it empty.
    pub models_by_category: IndexMap<String, Vec<ModelSummary>>,
}

type SharedPreload = Shared<BoxFuture<'static, PreloadedCatalog>>;

/// Fan-out/fan-in preloader with request coalescing and cache write-through.
pub struct CatalogPreloader {
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn CacheStore>,
    timeout: Duration,
    in_flight: Mutex<Option<SharedPreload>>,
}

impl CatalogPreloader {
    pub fn new(client: Arc<dyn CatalogClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            cache,
            timeout: PRELOAD_TIMEOUT,
            in_flight: Mutex::new(None),
        }
    }

    /// Overrides the join deadline; test hook and host tuning knob.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Preloads the full catalog, coalescing with any preload already in
    /// flight. Never fails: transport errors degrade to empty sections.
    pub async fn preload(&self) -> PreloadedCatalog {
        let shared = {
            let mut guard = self.in_flight.lock().expect("preload lock poisoned");
            match guard.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let future = run_preload(self.client.clone(), self.cache.clone(), self.timeout)
                        .boxed()
                        .shared();
                    *guard = Some(future.clone());
                    future
                }
            }
        };

        let catalog = shared.await;

        // The shared slot only coalesces callers that arrive while the
        // fetch is live; once it resolves, the next preload starts fresh.
        if let Ok(mut guard) = self.in_flight.lock() {
            *guard = None;
        }

        catalog
    }

    /// Rebuilds a catalog snapshot from cache without touching the network.
    /// Returns `None` when the category list has never been cached.
    pub fn cached(&self) -> Option<PreloadedCatalog> {
        let categories: Vec<Category> = serde_json::from_value(self.cache.get(CATEGORIES_CACHE_KEY)?).ok()?;
        let mut models_by_category = IndexMap::new();
        for category in &categories {
            let models = self
                .cache
                .get(&format!("{MODELS_CACHE_PREFIX}{}", category.value))
                .and_then(|value| serde_json::from_value(value).ok())
                .unwrap_or_default();
            models_by_category.insert(category.value.clone(), models);
        }
        Some(PreloadedCatalog {
            categories,
            models_by_category,
        })
    }

    /// Drops every cached catalog section so the next preload refetches.
    pub fn invalidate(&self) {
        self.cache.clear_prefix(CATEGORIES_CACHE_KEY);
        self.cache.clear_prefix(MODELS_CACHE_PREFIX);
    }
}

async fn run_preload(client: Arc<dyn CatalogClient>, cache: Arc<dyn CacheStore>, timeout: Duration) -> PreloadedCatalog {
    let categories = match client.list_categories().await {
        Ok(categories) => categories,
        Err(error) => {
            warn!(%error, "category preload failed; catalog will be empty");
            return PreloadedCatalog::default();
        }
    };

    // Every per-category fetch deposits its result as it settles, so a
    // timeout of the joined whole keeps whatever finished in time.
    let settled: Arc<Mutex<HashMap<String, Vec<ModelSummary>>>> = Arc::new(Mutex::new(HashMap::new()));
    let fetches = categories.iter().map(|category| {
        let client = client.clone();
        let settled = settled.clone();
        let category_value = category.value.clone();
        async move {
            let models = match client.list_models(&category_value).await {
                Ok(models) => models,
                Err(error) => {
                    warn!(category = %category_value, %error, "model list fetch failed");
                    Vec::new()
                }
            };
            if let Ok(mut map) = settled.lock() {
                map.insert(category_value, models);
            }
        }
    });

    if tokio::time::timeout(timeout, join_all(fetches)).await.is_err() {
        warn!("catalog preload timed out; keeping settled categories");
    }

    let mut settled = settled.lock().map(|map| map.clone()).unwrap_or_default();
    let mut models_by_category = IndexMap::new();
    for category in &categories {
        models_by_category.insert(category.value.clone(), settled.remove(&category.value).unwrap_or_default());
    }

    cache.set(CATEGORIES_CACHE_KEY, json!(&categories));
    for (category_value, models) in &models_by_category {
        cache.set(&format!("{MODELS_CACHE_PREFIX}{category_value}"), json!(models));
    }

    PreloadedCatalog {
        categories,
        models_by_category,
    }
}
