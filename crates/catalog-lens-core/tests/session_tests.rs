use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_lens_core::catalog::{CatalogEntry, SearchField};
use catalog_lens_core::classify::CategorySelection;
use catalog_lens_core::diff::{DiffMeta, DiffResult, DiffSummary};
use catalog_lens_core::session::{ExplorerSession, LoadState, SessionSettings};
use catalog_lens_core::taxonomy::OverrideDocument;
use catalog_lens_core::versions::{RawVersion, VersionListResponse};
use catalog_lens_core::{
    CatalogSource, DiffSelection, DirSource, Error, RuleGroup, SelectionHint, SortDirection, SortKey,
    TaxonomyStore,
};
use tempfile::tempdir;

/// Layout:
///   root/
///     filters.json        overrides adding character "izumi"
///     catalog.json        four entries
///     versions.json       1.0.0, 1.1.0 (live), a duplicate and a malformed entry
///     diffs/1.0.0__1.1.0.json   three items
fn write_data_dir(root: &Path) {
    fs::write(
        root.join("filters.json"),
        r#"{"media": {"image": ["jacket"]}, "characters": ["Izumi"]}"#,
    )
    .unwrap();
    fs::write(
        root.join("catalog.json"),
        r#"[
            {"label": "jacket_izumi_01", "type": "Texture2D", "size": 2048, "modifiedAt": 1700000000},
            {"label": "vo_kaho_skill_01.acb", "type": "CriAudio", "size": 512},
            {"label": "image_card_kaho_full", "type": "Texture2D", "size": 4096, "modifiedAt": 1700000500},
            {"label": "bgm_title.acb", "type": "CriAudio", "size": 9000}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("versions.json"),
        r#"{"current": "1.1.0", "versions": [
            {"version": "1.0.0"}, {"version": "1.1.0", "current": true},
            {"version": "1.0.0"}, {"current": false}
        ]}"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("diffs")).unwrap();
    fs::write(
        root.join("diffs").join("1.0.0__1.1.0.json"),
        r#"{"from": "1.0.0", "to": "1.1.0", "total": 3, "limit": 5000, "truncated": false,
            "summary": {"total": 3, "added": 1, "removed": 1, "modified": 1},
            "items": [
                {"label": "jacket_izumi_01", "status": "added", "to": {"type": "Texture2D", "size": 2048}},
                {"label": "old_banner", "status": "removed", "from": {"type": "Texture2D", "size": 10}},
                {"label": "bgm_title.acb", "status": "modified",
                 "from": {"type": "CriAudio", "size": 8000}, "to": {"type": "CriAudio", "size": 9000}}
            ]}"#,
    )
    .unwrap();
}

fn dir_session(root: &Path, settings: SessionSettings) -> ExplorerSession {
    ExplorerSession::new(
        Arc::new(DirSource::new(root)),
        Arc::new(TaxonomyStore::builtin()),
        settings,
    )
}

#[tokio::test]
async fn test_search_filter_and_page_over_directory() {
    let dir = tempdir().unwrap();
    write_data_dir(dir.path());
    let session = dir_session(
        dir.path(),
        SessionSettings {
            page_size: 1,
            ..SessionSettings::default()
        },
    );
    session.prepare_taxonomy().await;

    match session.search("", SearchField::All).await {
        LoadState::Loaded(entries) => assert_eq!(entries.len(), 4),
        other => panic!("search did not load: {:?}", other),
    }

    // "jacket" only classifies as image through the merged override tokens.
    let selection = CategorySelection {
        media: vec!["image".to_string()],
        ..Default::default()
    };
    let list = session
        .result_list(&selection, SortKey::ModifiedAt, SortDirection::Desc, 7)
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.current_page(), 2);
    assert_eq!(list.page().items[0].label, "jacket_izumi_01");

    let izumi = session.classifier().classify("jacket_izumi_01");
    assert_eq!(izumi.characters, vec!["izumi".to_string()]);
    assert!(session.classifier().belongs_to("jacket_izumi_01", RuleGroup::Media, "image"));
}

#[tokio::test]
async fn test_versions_and_diff_over_directory() {
    let dir = tempdir().unwrap();
    write_data_dir(dir.path());
    let session = dir_session(dir.path(), SessionSettings::default());

    let catalog = match session.load_versions().await {
        LoadState::Loaded(catalog) => catalog,
        other => panic!("versions did not load: {:?}", other),
    };
    assert_eq!(catalog.versions.len(), 2);
    assert_eq!(catalog.live(), Some("1.1.0"));

    let selection = catalog.default_pair(None, None);
    assert_eq!(selection, DiffSelection::new("1.0.0", "1.1.0"));

    let state = session.load_diff(&selection).await.unwrap();
    let result = state.loaded().unwrap();
    assert_eq!(result.items.len(), 3);
    assert_eq!(result.summary.added, 1);

    assert_eq!(
        session.load_diff(&DiffSelection::new("1.1.0", "1.1.0")).await,
        Err(SelectionHint::SameVersion)
    );
    // The rejected selection leaves the loaded diff in place.
    assert!(session.diff_state().loaded().is_some());
}

#[tokio::test]
async fn test_diff_limit_truncates_stored_document() {
    let dir = tempdir().unwrap();
    write_data_dir(dir.path());
    let session = dir_session(
        dir.path(),
        SessionSettings {
            diff_limit: 2,
            ..SessionSettings::default()
        },
    );
    session.load_versions().await;

    let state = session
        .load_diff(&DiffSelection::new("1.0.0", "1.1.0"))
        .await
        .unwrap();
    let result = state.loaded().unwrap();
    assert_eq!(result.items.len(), 2);
    assert!(result.meta.truncated);
    assert_eq!(result.meta.total, 3);
    assert_eq!(result.summary.total, 3);
}

#[tokio::test]
async fn test_missing_data_is_failed_not_empty() {
    let dir = tempdir().unwrap();
    let session = dir_session(dir.path(), SessionSettings::default());
    session.prepare_taxonomy().await;

    assert!(session.search("kaho", SearchField::Label).await.is_failed());
    assert!(session.load_versions().await.is_failed());
    assert_eq!(
        session.load_diff(&DiffSelection::new("1", "2")).await,
        Err(SelectionHint::VersionsFailed)
    );
}

#[tokio::test]
async fn test_single_version_hint_differs_from_failed_list() {
    let failed_dir = tempdir().unwrap();
    let failed = dir_session(failed_dir.path(), SessionSettings::default());
    failed.load_versions().await;

    let single_dir = tempdir().unwrap();
    fs::write(
        single_dir.path().join("versions.json"),
        r#"{"current": "1.0.0", "versions": [{"version": "1.0.0", "current": true}]}"#,
    )
    .unwrap();
    let single = dir_session(single_dir.path(), SessionSettings::default());
    assert!(single.load_versions().await.loaded().is_some());

    let selection = DiffSelection::new("1.0.0", "1.1.0");
    let failed_hint = failed.load_diff(&selection).await.unwrap_err();
    let single_hint = single.load_diff(&selection).await.unwrap_err();
    assert_eq!(failed_hint, SelectionHint::VersionsFailed);
    assert_eq!(single_hint, SelectionHint::Unavailable);
    assert_ne!(failed_hint, single_hint);
}

#[tokio::test]
async fn test_diff_before_version_list_is_pending() {
    let dir = tempdir().unwrap();
    write_data_dir(dir.path());
    let session = dir_session(dir.path(), SessionSettings::default());
    assert_eq!(
        session.load_diff(&DiffSelection::new("1.0.0", "1.1.0")).await,
        Err(SelectionHint::VersionsPending)
    );
    assert_eq!(session.diff_state(), LoadState::Idle);
}

/// Serves diffs whose latency depends on the "from" version.
struct SlowDiffSource;

#[async_trait]
impl CatalogSource for SlowDiffSource {
    async fn fetch_overrides(&self) -> Result<OverrideDocument, Error> {
        Ok(OverrideDocument::default())
    }

    async fn search(&self, _query: &str, _field: SearchField) -> Result<Vec<CatalogEntry>, Error> {
        Ok(Vec::new())
    }

    async fn versions(&self) -> Result<VersionListResponse, Error> {
        Ok(VersionListResponse {
            current: Some("3".to_string()),
            versions: ["1", "2", "3"]
                .iter()
                .map(|v| RawVersion {
                    version: Some(v.to_string()),
                    current: None,
                })
                .collect(),
        })
    }

    async fn diff(&self, from: &str, to: &str, limit: u32) -> Result<DiffResult, Error> {
        let delay = if from == "1" { 80 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(DiffResult {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            items: Vec::new(),
            summary: DiffSummary::default(),
            meta: DiffMeta {
                total: 0,
                limit: u64::from(limit),
                truncated: false,
            },
        })
    }
}

#[tokio::test]
async fn test_superseded_diff_cannot_overwrite_newer() {
    let session = ExplorerSession::new(
        Arc::new(SlowDiffSource),
        Arc::new(TaxonomyStore::builtin()),
        SessionSettings::default(),
    );
    session.load_versions().await;

    let older = DiffSelection::new("1", "3");
    let newer = DiffSelection::new("2", "3");
    let slow = session.load_diff(&older);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.load_diff(&newer).await
    };
    let _ = tokio::join!(slow, fast);

    let state = session.diff_state();
    let result = state.loaded().unwrap();
    assert_eq!(result.from.as_deref(), Some("2"));
}
