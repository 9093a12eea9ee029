//! Catalog plumbing for the WaveSpeed node.
//!
//! This crate owns everything between the remote model catalog and the
//! engine: the process-wide [`cache::CacheStore`], the [`client`] that
//! talks to the catalog and platform endpoints, the [`preload`] fan-out
//! that warms the cache, the [`search`] controller behind the model picker,
//! media [`upload`], and API-key [`config`] resolution.

pub mod cache;
pub mod client;
pub mod config;
pub mod preload;
pub mod search;
pub mod upload;

pub use cache::{CacheStore, FileCacheStore, MemoryCacheStore};
pub use client::{CatalogClient, CatalogError, HttpCatalogClient};
pub use config::{delete_api_key, effective_api_key, has_api_key, save_api_key, set_runtime_api_key};
pub use preload::{CatalogPreloader, PreloadedCatalog};
pub use search::{CatalogSearchController, RankedModel};
pub use upload::{UploadError, upload_media};
