pub mod dir;

pub use dir::DirSource;

use crate::catalog::{CatalogEntry, SearchField};
use crate::diff::DiffResult;
use crate::error::Error;
use crate::taxonomy::OverrideDocument;
use crate::versions::VersionListResponse;
use async_trait::async_trait;

/// Where catalog data comes from.
///
/// Every call may fail independently; callers decide whether a failure is
/// fatal (search, diff) or ignorable (overrides).
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Server-side additions to the category taxonomy.
    async fn fetch_overrides(&self) -> Result<OverrideDocument, Error>;

    async fn search(&self, query: &str, field: SearchField) -> Result<Vec<CatalogEntry>, Error>;

    async fn versions(&self) -> Result<VersionListResponse, Error>;

    /// At most `limit` items are returned; a shorter list is flagged truncated.
    async fn diff(&self, from: &str, to: &str, limit: u32) -> Result<DiffResult, Error>;
}
