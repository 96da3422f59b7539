//! Presentation of a precomputed comparison between two catalog snapshots.
//!
//! The diff itself is computed elsewhere and may arrive truncated. Everything
//! here works on what was received and never infers totals from the item
//! list: counts always come from the authoritative summary and meta.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
    #[serde(other)]
    Unknown,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Added => "added",
            DiffStatus::Removed => "removed",
            DiffStatus::Modified => "modified",
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(DiffStatus::Added),
            "removed" => Ok(DiffStatus::Removed),
            "modified" => Ok(DiffStatus::Modified),
            "unchanged" => Ok(DiffStatus::Unchanged),
            other => Err(format!("unknown diff status '{}'", other)),
        }
    }
}

/// One side of a diff item: the entry as it was in one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub resource_type: u32,
    #[serde(rename = "realName", alias = "displayName", default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffItem {
    pub label: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<SnapshotRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<SnapshotRecord>,
}

impl DiffItem {
    /// `added` has no "from", `removed` has no "to", the rest carry both.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            DiffStatus::Added => self.from.is_none() && self.to.is_some(),
            DiffStatus::Removed => self.from.is_some() && self.to.is_none(),
            DiffStatus::Modified | DiffStatus::Unchanged => self.from.is_some() && self.to.is_some(),
            DiffStatus::Unknown => true,
        }
    }

    fn keyword_haystack(&self) -> String {
        let from = self.from.as_ref();
        let to = self.to.as_ref();
        [
            self.label.as_str(),
            self.status.as_str(),
            from.map(|r| r.entry_type.as_str()).unwrap_or_default(),
            to.map(|r| r.entry_type.as_str()).unwrap_or_default(),
            from.map(|r| r.display_name.as_str()).unwrap_or_default(),
            to.map(|r| r.display_name.as_str()).unwrap_or_default(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub removed: u64,
    #[serde(default)]
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub truncated: bool,
}

/// A diff document as returned by the diff endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub items: Vec<DiffItem>,
    #[serde(default)]
    pub summary: DiffSummary,
    #[serde(flatten)]
    pub meta: DiffMeta,
}

impl DiffResult {
    /// Fewer items than the declared total were delivered.
    pub fn is_partial(&self) -> bool {
        self.meta.truncated || (self.items.len() as u64) < self.meta.total
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DiffStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: DiffStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse::<DiffStatus>().map(StatusFilter::Only)
    }
}

/// Status line shown alongside a presented diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiffHint {
    /// The comparison has no differences at all.
    Empty,
    /// Differences exist but none pass the current filters.
    NoMatch,
    /// The server cut the item list at `limit` out of `total`.
    Truncated { total: u64, limit: u64 },
    /// `shown` items pass the filters out of a complete list of `total`.
    Loaded { shown: u64, total: u64 },
}

impl fmt::Display for DiffHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffHint::Empty => f.write_str("No differences between the selected versions."),
            DiffHint::NoMatch => f.write_str("No differences match the current filters."),
            DiffHint::Truncated { total, limit } => write!(
                f,
                "Showing the first {} of {} differences; the list was truncated.",
                limit, total
            ),
            DiffHint::Loaded { shown, total } => write!(f, "Loaded {} of {} differences.", shown, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffView<'a> {
    pub items: Vec<&'a DiffItem>,
    pub summary: DiffSummary,
    pub meta: DiffMeta,
    pub hint: DiffHint,
}

/// Filter a received diff by status and keyword and pick the hint to show.
///
/// The keyword is trimmed and matched case-insensitively; a blank or
/// whitespace-only keyword does not filter.
pub fn present<'a>(result: &'a DiffResult, status: StatusFilter, keyword: &str) -> DiffView<'a> {
    let keyword = keyword.trim().to_lowercase();
    let items: Vec<&DiffItem> = result
        .items
        .iter()
        .filter(|item| status.accepts(item.status))
        .filter(|item| keyword.is_empty() || item.keyword_haystack().contains(&keyword))
        .collect();

    let hint = if result.meta.total == 0 && result.items.is_empty() {
        DiffHint::Empty
    } else if items.is_empty() {
        DiffHint::NoMatch
    } else if result.meta.truncated {
        DiffHint::Truncated {
            total: result.meta.total,
            limit: result.meta.limit,
        }
    } else {
        DiffHint::Loaded {
            shown: items.len() as u64,
            total: result.meta.total.max(result.items.len() as u64),
        }
    };

    DiffView {
        items,
        summary: result.summary,
        meta: result.meta,
        hint,
    }
}

/// Whether a diff row may link into the live entry view.
///
/// Removed entries no longer exist, and any "to" version other than the live
/// one would open the live entry under the wrong snapshot.
pub fn can_open_entry(item: &DiffItem, selected_to: &str, live_version: Option<&str>) -> bool {
    if item.status == DiffStatus::Removed {
        return false;
    }
    match live_version {
        Some(live) => !live.is_empty() && live == selected_to,
        None => false,
    }
}

const CHECKSUM_ELIDE_OVER: usize = 14;
const CHECKSUM_KEEP: usize = 7;

/// Long checksums display as `first7...last7`, absent ones as `-`.
pub fn format_checksum(checksum: Option<&str>) -> String {
    let value = match checksum {
        Some(value) if !value.is_empty() => value,
        _ => return "-".to_string(),
    };
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= CHECKSUM_ELIDE_OVER {
        return value.to_string();
    }
    let head: String = chars[..CHECKSUM_KEEP].iter().collect();
    let tail: String = chars[chars.len() - CHECKSUM_KEEP..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Per-status tallies of a presented list, for the visible page only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub unknown: usize,
}

pub fn status_counts<'a, I>(items: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a DiffItem>,
{
    let mut counts = StatusCounts::default();
    for item in items {
        match item.status {
            DiffStatus::Added => counts.added += 1,
            DiffStatus::Removed => counts.removed += 1,
            DiffStatus::Modified => counts.modified += 1,
            DiffStatus::Unchanged => counts.unchanged += 1,
            DiffStatus::Unknown => counts.unknown += 1,
        }
    }
    counts
}
