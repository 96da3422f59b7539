use crate::catalog::{CatalogEntry, SearchField};
use crate::classify::{CategorySelection, Classifier, MatchMode};
use crate::config::AppConfig;
use crate::diff::DiffResult;
use crate::error::Error;
use crate::listing::{ResultList, SortDirection, SortKey};
use crate::source::CatalogSource;
use crate::taxonomy::TaxonomyStore;
use crate::versions::{DiffSelection, SelectionHint, VersionCatalog};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Where a fetched view model stands.
///
/// `Failed` is kept apart from a `Loaded` empty result so callers can tell
/// "nothing matched" from "could not ask".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }
}

/// Identifies one issued request. Larger is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Hands out strictly increasing request tokens.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.issued.load(Ordering::SeqCst) == token.0
    }
}

/// A load-state slot that only the newest request may write.
///
/// Responses carrying an older token than the last one issued are dropped,
/// so a slow superseded request cannot overwrite a newer result.
#[derive(Debug)]
pub struct Latest<T> {
    sequencer: RequestSequencer,
    state: Mutex<LoadState<T>>,
}

impl<T: Clone> Latest<T> {
    pub fn new() -> Self {
        Self {
            sequencer: RequestSequencer::new(),
            state: Mutex::new(LoadState::Idle),
        }
    }

    /// Issue a token and mark the slot as loading.
    pub fn begin(&self) -> RequestToken {
        let mut state = self.lock();
        let token = self.sequencer.next();
        *state = LoadState::Loading;
        token
    }

    /// Store the outcome for `token`. Returns false if the token was stale.
    pub fn resolve(&self, token: RequestToken, result: Result<T, Error>) -> bool {
        let mut state = self.lock();
        if !self.sequencer.is_latest(token) {
            debug!("Discarding response for superseded request {}", token.value());
            return false;
        }
        *state = match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        true
    }

    pub fn state(&self) -> LoadState<T> {
        self.lock().clone()
    }

    pub fn loaded(&self) -> Option<T> {
        self.lock().loaded().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, LoadState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for Latest<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Display settings a session applies to its view models.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub page_size: usize,
    pub diff_limit: u32,
    pub match_mode: MatchMode,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            diff_limit: config.diff_limit,
            match_mode: config.match_mode,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Ties a data source to the taxonomy and the three fetched view models:
/// search results, the version list and the current diff.
///
/// All methods take `&self`; a session can be shared between tasks and each
/// slot keeps only its newest response.
pub struct ExplorerSession {
    source: Arc<dyn CatalogSource>,
    classifier: Classifier,
    settings: SessionSettings,
    search: Latest<Vec<CatalogEntry>>,
    versions: Latest<VersionCatalog>,
    diff: Latest<DiffResult>,
}

impl ExplorerSession {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<TaxonomyStore>, settings: SessionSettings) -> Self {
        Self {
            source,
            classifier: Classifier::new(store),
            settings,
            search: Latest::new(),
            versions: Latest::new(),
            diff: Latest::new(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Merge server taxonomy overrides once. Never fails.
    pub async fn prepare_taxonomy(&self) {
        self.classifier.store().load_overrides(self.source.as_ref()).await;
    }

    pub async fn search(&self, query: &str, field: SearchField) -> LoadState<Vec<CatalogEntry>> {
        let token = self.search.begin();
        let result = self.source.search(query, field).await;
        if let Err(e) = &result {
            warn!("Search '{}' failed: {}", query, e);
        }
        self.search.resolve(token, result);
        self.search.state()
    }

    pub async fn load_versions(&self) -> LoadState<VersionCatalog> {
        let token = self.versions.begin();
        let result = self.source.versions().await.map(VersionCatalog::from_response);
        match &result {
            Ok(catalog) => info!("Loaded {} catalog versions", catalog.versions.len()),
            Err(e) => warn!("Version list unavailable: {}", e),
        }
        self.versions.resolve(token, result);
        self.versions.state()
    }

    /// Fetch the diff for `selection`.
    ///
    /// The selection is checked against the loaded version list first; an
    /// invalid one returns a hint and leaves the current diff untouched. A
    /// version list that failed or never loaded gets its own hint, never the
    /// one for a catalog with too few versions.
    pub async fn load_diff(&self, selection: &DiffSelection) -> Result<LoadState<DiffResult>, SelectionHint> {
        let pair = match self.versions.state() {
            LoadState::Loaded(catalog) => selection.validate(&catalog)?,
            LoadState::Failed(_) => return Err(SelectionHint::VersionsFailed),
            LoadState::Idle | LoadState::Loading => return Err(SelectionHint::VersionsPending),
        };

        let token = self.diff.begin();
        let result = self.source.diff(&pair.from, &pair.to, self.settings.diff_limit).await;
        if let Err(e) = &result {
            warn!("Diff {} -> {} failed: {}", pair.from, pair.to, e);
        }
        self.diff.resolve(token, result);
        Ok(self.diff.state())
    }

    pub fn search_state(&self) -> LoadState<Vec<CatalogEntry>> {
        self.search.state()
    }

    pub fn versions_state(&self) -> LoadState<VersionCatalog> {
        self.versions.state()
    }

    pub fn diff_state(&self) -> LoadState<DiffResult> {
        self.diff.state()
    }

    /// Category-filtered, sorted result list over the loaded search results.
    ///
    /// `None` until a search has loaded. The requested page is clamped
    /// against the filtered list.
    pub fn result_list(
        &self,
        selection: &CategorySelection,
        key: SortKey,
        direction: SortDirection,
        page: usize,
    ) -> Option<ResultList> {
        let entries = self.search.loaded()?;
        let filtered = self
            .classifier
            .filter_entries(&entries, selection, self.settings.match_mode);
        let mut list = ResultList::new(self.settings.page_size).with_sort(key, direction);
        list.set_entries(filtered);
        list.set_page(page);
        Some(list)
    }
}
