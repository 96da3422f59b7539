use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Raw version-list payload; entries may be malformed or repeated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionListResponse {
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVersion {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub current: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub current: bool,
}

/// Clean list of known catalog snapshots, newest id first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionCatalog {
    pub current: Option<String>,
    pub versions: Vec<VersionInfo>,
}

impl VersionCatalog {
    /// Drop entries without an id and keep only the first occurrence of each
    /// id, then order by id descending.
    pub fn from_response(response: VersionListResponse) -> Self {
        let current = response
            .current
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let mut seen = HashSet::new();
        let mut versions = Vec::new();
        let mut dropped = 0usize;
        for raw in response.versions {
            let version = match raw.version.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            if !seen.insert(version.clone()) {
                dropped += 1;
                continue;
            }
            let is_current =
                raw.current.unwrap_or(false) || current.as_deref() == Some(version.as_str());
            versions.push(VersionInfo {
                version,
                current: is_current,
            });
        }
        if dropped > 0 {
            debug!("Dropped {} malformed or duplicate version entries", dropped);
        }

        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Self { current, versions }
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    /// The live version: the declared current id, else one flagged current.
    pub fn live(&self) -> Option<&str> {
        self.current
            .as_deref()
            .or_else(|| self.versions.iter().find(|v| v.current).map(|v| v.version.as_str()))
    }

    /// A diff needs at least two distinct snapshots.
    pub fn diff_available(&self) -> bool {
        self.versions.len() >= 2
    }

    /// Pick the from/to pair to preselect.
    ///
    /// "to" is the requested version when known, else the live one, else the
    /// newest. "from" is the requested version when known and different from
    /// "to", else the newest version that differs from "to".
    pub fn default_pair(&self, requested_from: Option<&str>, requested_to: Option<&str>) -> DiffSelection {
        let known = |v: Option<&str>| v.filter(|v| !v.is_empty() && self.contains(v)).map(str::to_string);

        let to = known(requested_to)
            .or_else(|| known(self.live()))
            .or_else(|| self.versions.first().map(|v| v.version.clone()));

        let from = known(requested_from)
            .filter(|from| Some(from) != to.as_ref())
            .or_else(|| {
                self.versions
                    .iter()
                    .find(|v| Some(&v.version) != to.as_ref())
                    .map(|v| v.version.clone())
            });

        DiffSelection { from, to }
    }
}

/// User's current choice of versions to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSelection {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// A validated pair of distinct versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPair {
    pub from: String,
    pub to: String,
}

/// Why a diff cannot run for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionHint {
    /// Fewer than two distinct versions exist.
    Unavailable,
    /// One side has not been chosen.
    NeedVersions,
    /// Both sides name the same version.
    SameVersion,
    /// The version list could not be fetched.
    VersionsFailed,
    /// The version list has not been fetched yet.
    VersionsPending,
}

impl fmt::Display for SelectionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionHint::Unavailable => f.write_str("At least two catalog versions are needed to compare."),
            SelectionHint::NeedVersions => f.write_str("Choose both a from and a to version."),
            SelectionHint::SameVersion => f.write_str("From and to must be different versions."),
            SelectionHint::VersionsFailed => f.write_str("The version list could not be loaded."),
            SelectionHint::VersionsPending => f.write_str("The version list is still loading."),
        }
    }
}

impl DiffSelection {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        }
    }

    pub fn validate(&self, catalog: &VersionCatalog) -> Result<DiffPair, SelectionHint> {
        if !catalog.diff_available() {
            return Err(SelectionHint::Unavailable);
        }
        let from = self.from.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let to = self.to.as_deref().map(str::trim).filter(|v| !v.is_empty());
        match (from, to) {
            (Some(from), Some(to)) if from == to => Err(SelectionHint::SameVersion),
            (Some(from), Some(to)) => Ok(DiffPair {
                from: from.to_string(),
                to: to.to_string(),
            }),
            _ => Err(SelectionHint::NeedVersions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(current: &str, versions: &[(Option<&str>, bool)]) -> VersionListResponse {
        VersionListResponse {
            current: Some(current.to_string()),
            versions: versions
                .iter()
                .map(|(v, c)| RawVersion {
                    version: v.map(str::to_string),
                    current: Some(*c),
                })
                .collect(),
        }
    }

    #[test]
    fn test_dedupes_and_drops_malformed() {
        let catalog = VersionCatalog::from_response(response(
            "1.2.0",
            &[
                (Some("1.0.0"), false),
                (None, false),
                (Some("1.2.0"), false),
                (Some("1.0.0"), true),
                (Some("  "), false),
            ],
        ));
        let ids: Vec<&str> = catalog.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(ids, vec!["1.2.0", "1.0.0"]);
        // First occurrence of 1.0.0 wins, so its current flag stays false.
        assert!(!catalog.versions[1].current);
        assert!(catalog.versions[0].current);
    }

    #[test]
    fn test_decodes_payload() {
        let json = r#"{"current":"b","versions":[{"version":"a"},{"version":"b","current":true},{}]}"#;
        let raw: VersionListResponse = serde_json::from_str(json).unwrap();
        let catalog = VersionCatalog::from_response(raw);
        assert_eq!(catalog.versions.len(), 2);
        assert_eq!(catalog.live(), Some("b"));
    }

    #[test]
    fn test_single_version_disables_diff() {
        let catalog = VersionCatalog::from_response(response("1.0.0", &[(Some("1.0.0"), true)]));
        let selection = DiffSelection::new("1.0.0", "1.0.0");
        assert_eq!(selection.validate(&catalog), Err(SelectionHint::Unavailable));
    }

    #[test]
    fn test_same_version_is_a_hint() {
        let catalog = VersionCatalog::from_response(response(
            "2",
            &[(Some("1"), false), (Some("2"), true)],
        ));
        assert_eq!(
            DiffSelection::new("2", "2").validate(&catalog),
            Err(SelectionHint::SameVersion)
        );
        assert_eq!(
            DiffSelection::default().validate(&catalog),
            Err(SelectionHint::NeedVersions)
        );
        assert_eq!(
            DiffSelection::new("1", "2").validate(&catalog),
            Ok(DiffPair { from: "1".into(), to: "2".into() })
        );
    }

    #[test]
    fn test_default_pair() {
        let catalog = VersionCatalog::from_response(response(
            "2",
            &[(Some("1"), false), (Some("2"), true), (Some("3"), false)],
        ));
        assert_eq!(catalog.default_pair(None, None), DiffSelection::new("3", "2"));
        assert_eq!(catalog.default_pair(Some("1"), Some("3")), DiffSelection::new("1", "3"));
        // Requested from equal to "to" falls back to another version.
        assert_eq!(catalog.default_pair(Some("2"), None), DiffSelection::new("3", "2"));
        assert_eq!(catalog.default_pair(Some("9"), Some("9")), DiffSelection::new("3", "2"));
    }
}
