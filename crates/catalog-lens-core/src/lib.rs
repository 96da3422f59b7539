//! Catalog exploration engine: category matching over asset labels, sorted
//! and paginated result lists, and presentation of catalog version diffs.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod listing;
pub mod matcher;
pub mod session;
pub mod source;
pub mod taxonomy;
pub mod versions;

pub use catalog::{entry_types, search_entries, CatalogEntry, SearchField};
pub use classify::{CategorySelection, Classification, Classifier, MatchMode};
pub use config::AppConfig;
pub use diff::{present, DiffHint, DiffResult, DiffStatus, DiffView, StatusFilter};
pub use error::Error;
pub use listing::{paginate, sort_entries, Page, ResultList, SortDirection, SortKey};
pub use matcher::{matches, tokenize_label, TokenSet};
pub use session::{ExplorerSession, LoadState, SessionSettings};
pub use source::{CatalogSource, DirSource};
pub use taxonomy::{CategoryRule, RuleGroup, Taxonomy, TaxonomyStore};
pub use versions::{DiffSelection, SelectionHint, VersionCatalog};
