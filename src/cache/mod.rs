//! Offline asset cache.
//!
//! On install a fixed manifest of static assets is fetched into a named
//! cache, all or nothing. Afterwards every request is answered from the cache
//! when possible and otherwise passed through to the network untouched.
//! Network responses are never written back.

mod error;
mod fetch;
mod manifest;
mod storage;

use std::sync::Arc;

use futures::future::try_join_all;
use reqwest::Url;
use tracing::{debug, info, warn};

pub use error::CacheError;
pub use fetch::{AssetRequest, AssetResponse, Fetcher, HttpFetcher};
pub use manifest::{resolve_path, Manifest};
pub use storage::{cache_key, CacheStorage};

pub const DEFAULT_CACHE_NAME: &str = "pest-control-memo-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Uninstalled,
    Installed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub cache_name: String,
    pub urls: Vec<Url>,
}

/// Handle to the offline cache. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct AssetCache {
    name: String,
    origin: Url,
    manifest: Manifest,
    storage: Arc<CacheStorage>,
}

impl AssetCache {
    pub fn new(name: impl Into<String>, origin: &str, manifest: Manifest) -> Result<Self, CacheError> {
        let origin = Url::parse(origin).map_err(|e| CacheError::InvalidUrl {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: name.into(),
            origin,
            manifest,
            storage: Arc::new(CacheStorage::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub async fn state(&self) -> InstallState {
        if self.storage.has(&self.name).await {
            InstallState::Installed
        } else {
            InstallState::Uninstalled
        }
    }

    /// Build a GET request for a path relative to the asset origin.
    pub fn request_for(&self, path: &str) -> Result<AssetRequest, CacheError> {
        Ok(AssetRequest::get(resolve_path(&self.origin, path)?))
    }

    /// Fetch every manifest entry and store them in the named cache.
    ///
    /// Any failed fetch or non-2xx response fails the whole install and
    /// nothing is stored. There is no retry.
    pub async fn install(&self, fetcher: &dyn Fetcher) -> Result<InstallReport, CacheError> {
        let urls = self.manifest.resolve(&self.origin)?;
        debug!(cache = %self.name, assets = urls.len(), "installing asset cache");

        let fetches = urls.iter().map(|url| async move {
            let request = AssetRequest::get(url.clone());
            let response = fetcher.fetch(&request).await?;
            if !response.is_ok() {
                return Err(CacheError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok((cache_key(url), response))
        });

        let entries = match try_join_all(fetches).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(cache = %self.name, error = %e, "asset cache install failed");
                return Err(e);
            }
        };

        self.storage.put_all(&self.name, entries).await;
        info!(cache = %self.name, assets = urls.len(), "asset cache installed");

        Ok(InstallReport {
            cache_name: self.name.clone(),
            urls,
        })
    }

    /// Answer a request from the cache, or pass it to the network unmodified.
    pub async fn respond(
        &self,
        request: &AssetRequest,
        fetcher: &dyn Fetcher,
    ) -> Result<(AssetResponse, ResponseSource), CacheError> {
        if let Some(cached) = self.storage.match_request(request).await {
            debug!(url = %request.url, "served from cache");
            return Ok((cached, ResponseSource::Cache));
        }

        let response = fetcher.fetch(request).await?;
        Ok((response, ResponseSource::Network))
    }
}
