use super::CatalogSource;
use crate::catalog::{search_entries, CatalogEntry, SearchField};
use crate::diff::DiffResult;
use crate::error::Error;
use crate::taxonomy::OverrideDocument;
use crate::versions::VersionListResponse;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const OVERRIDES_FILE: &str = "filters.json";
pub const CATALOG_FILE: &str = "catalog.json";
pub const VERSIONS_FILE: &str = "versions.json";
pub const DIFFS_DIR: &str = "diffs";

/// Serves catalog data from JSON files under one directory:
///
/// ```text
/// <root>/filters.json
/// <root>/catalog.json
/// <root>/versions.json
/// <root>/diffs/<from>__<to>.json
/// ```
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn diff_path(&self, from: &str, to: &str) -> PathBuf {
        self.root.join(DIFFS_DIR).join(format!(
            "{}__{}.json",
            sanitize_version(from),
            sanitize_version(to)
        ))
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, Error> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Read {} bytes from {}", text.len(), path.display());
        Ok(serde_json::from_str(&text)?)
    }
}

/// Version ids become file name fragments; anything outside
/// `[A-Za-z0-9._-]` is replaced with `_`.
pub fn sanitize_version(version: &str) -> String {
    version
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Cut `result` down to `limit` items, keeping the declared totals.
///
/// The stored limit is replaced only when this cut applies. A document that
/// was already truncated when stored keeps the smaller of its own limit and
/// `limit`.
pub fn apply_limit(mut result: DiffResult, limit: u32) -> DiffResult {
    let requested = u64::from(limit);
    let delivered = result.items.len() as u64;
    result.meta.total = result.meta.total.max(delivered);
    if delivered > requested {
        result.items.truncate(limit as usize);
        result.meta.truncated = true;
        result.meta.limit = requested;
    } else if result.meta.truncated {
        let stored = if result.meta.limit > 0 { result.meta.limit } else { delivered };
        result.meta.limit = stored.min(requested);
    } else if result.meta.limit == 0 {
        result.meta.limit = requested;
    }
    result
}

#[async_trait]
impl CatalogSource for DirSource {
    async fn fetch_overrides(&self) -> Result<OverrideDocument, Error> {
        self.read_json(&self.root.join(OVERRIDES_FILE)).await
    }

    async fn search(&self, query: &str, field: SearchField) -> Result<Vec<CatalogEntry>, Error> {
        let entries: Vec<CatalogEntry> = self.read_json(&self.root.join(CATALOG_FILE)).await?;
        let found = search_entries(&entries, query, field);
        info!("Search '{}' in {} matched {} of {} entries", query, field, found.len(), entries.len());
        Ok(found)
    }

    async fn versions(&self) -> Result<VersionListResponse, Error> {
        self.read_json(&self.root.join(VERSIONS_FILE)).await
    }

    async fn diff(&self, from: &str, to: &str, limit: u32) -> Result<DiffResult, Error> {
        if from.trim() == to.trim() {
            return Err(Error::Source("from and to must be different versions".to_string()));
        }
        let mut result: DiffResult = self.read_json(&self.diff_path(from, to)).await?;
        result.from.get_or_insert_with(|| from.to_string());
        result.to.get_or_insert_with(|| to.to_string());
        Ok(apply_limit(result, limit))
    }
}
