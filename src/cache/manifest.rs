use std::collections::HashSet;

use reqwest::Url;

use super::CacheError;

/// Assets pre-cached on install. The repeated icon entry is harmless, entries
/// are deduplicated once resolved.
pub const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/main.js",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
    "./manifest.png",
];

#[derive(Debug, Clone)]
pub struct Manifest {
    paths: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS.iter().map(|path| path.to_string()).collect())
    }
}

impl Manifest {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Resolve every path against `origin`, keeping the first occurrence of
    /// each distinct URL.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<Url>, CacheError> {
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(self.paths.len());

        for path in &self.paths {
            let url = resolve_path(origin, path)?;
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        Ok(urls)
    }
}

pub fn resolve_path(origin: &Url, path: &str) -> Result<Url, CacheError> {
    origin.join(path).map_err(|e| CacheError::InvalidUrl {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
