use std::collections::HashMap;

use reqwest::{Method, Url};
use tokio::sync::RwLock;

use super::{AssetRequest, AssetResponse};

/// Named caches of responses keyed by URL, in memory only.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, HashMap<String, AssetResponse>>>,
}

/// Cache key for a URL. Fragments never reach the server, so they are ignored.
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.caches.read().await.contains_key(name)
    }

    /// Open (or create) the named cache and store every entry under one write.
    pub async fn put_all(&self, name: &str, entries: Vec<(String, AssetResponse)>) {
        let mut caches = self.caches.write().await;
        let cache = caches.entry(name.to_string()).or_default();
        cache.extend(entries);
    }

    /// Look a request up across every cache. Only GET requests can match.
    pub async fn match_request(&self, request: &AssetRequest) -> Option<AssetResponse> {
        if request.method != Method::GET {
            return None;
        }

        let key = cache_key(&request.url);
        let caches = self.caches.read().await;
        caches.values().find_map(|cache| cache.get(&key).cloned())
    }

    pub async fn keys(&self, name: &str) -> Vec<String> {
        let caches = self.caches.read().await;
        let mut keys: Vec<String> = caches
            .get(name)
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
