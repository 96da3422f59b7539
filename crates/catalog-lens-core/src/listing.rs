use crate::catalog::CatalogEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Label,
    Type,
    ResourceType,
    Size,
    RealName,
    ModifiedAt,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "label" => Ok(SortKey::Label),
            "type" => Ok(SortKey::Type),
            "resourcetype" | "resource-type" | "resource_type" => Ok(SortKey::ResourceType),
            "size" => Ok(SortKey::Size),
            "realname" | "real-name" | "real_name" | "name" => Ok(SortKey::RealName),
            "modifiedat" | "modified-at" | "modified_at" | "modified" => Ok(SortKey::ModifiedAt),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

fn compare_entries(a: &CatalogEntry, b: &CatalogEntry, key: SortKey, direction: SortDirection) -> Ordering {
    match key {
        SortKey::Label => direction.apply(a.label.to_lowercase().cmp(&b.label.to_lowercase())),
        SortKey::Type => direction.apply(a.entry_type.to_lowercase().cmp(&b.entry_type.to_lowercase())),
        SortKey::RealName => {
            direction.apply(a.real_name.to_lowercase().cmp(&b.real_name.to_lowercase()))
        }
        SortKey::ResourceType => direction.apply(a.resource_type.cmp(&b.resource_type)),
        SortKey::Size => direction.apply(a.size.cmp(&b.size)),
        // Unknown timestamps trail in both directions.
        SortKey::ModifiedAt => match (a.modified_at(), b.modified_at()) {
            (Some(left), Some(right)) => direction.apply(left.cmp(&right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Stable sort: entries with equal keys keep their relative order.
pub fn sort_entries(entries: &mut [CatalogEntry], key: SortKey, direction: SortDirection) {
    entries.sort_by(|a, b| compare_entries(a, b, key, direction));
}

/// One window of a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based index of the first item on this page, 0 when the page is empty.
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    count.div_ceil(page_size).max(1)
}

pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

/// Slice out the requested page, clamping the page number into range first.
pub fn paginate<T>(items: &[T], page_size: usize, requested_page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = clamp_page(requested_page, total_pages);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    Page {
        items: &items[start..end],
        page,
        page_size,
        total_pages,
        total_items: items.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page(usize),
    Gap,
}

/// Page-button strip: first, last, and the neighbours of `current`, with a
/// gap marker where a run of pages is skipped.
pub fn page_window(current: usize, total_pages: usize) -> Vec<PageButton> {
    let total_pages = total_pages.max(1);
    let current = clamp_page(current, total_pages);
    let mut buttons = Vec::new();
    for i in 1..=total_pages {
        if i == 1 || i == total_pages || i.abs_diff(current) <= 1 {
            buttons.push(PageButton::Page(i));
        } else if i + 2 == current || i == current + 2 {
            buttons.push(PageButton::Gap);
        }
    }
    buttons
}

/// A sorted, paged view over catalog entries.
///
/// Every mutator re-establishes the page invariant: the current page always
/// lies in `[1, total_pages]` for the list as it is now.
#[derive(Debug, Clone)]
pub struct ResultList {
    entries: Vec<CatalogEntry>,
    sort_key: SortKey,
    direction: SortDirection,
    page_size: usize,
    page: usize,
}

impl ResultList {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn with_sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.direction = direction;
        self
    }

    /// Replace the underlying entries (a new search or filter result).
    pub fn set_entries(&mut self, entries: Vec<CatalogEntry>) {
        self.entries = entries;
        sort_entries(&mut self.entries, self.sort_key, self.direction);
        self.clamp();
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort_key = key;
        self.direction = direction;
        sort_entries(&mut self.entries, key, direction);
        self.clamp();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
        self.clamp();
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort(&self) -> (SortKey, SortDirection) {
        (self.sort_key, self.direction)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.entries.len(), self.page_size)
    }

    pub fn page(&self) -> Page<'_, CatalogEntry> {
        paginate(&self.entries, self.page_size, self.page)
    }

    fn clamp(&mut self) {
        let clamped = clamp_page(self.page, self.total_pages());
        if clamped != self.page {
            debug!("Clamping page {} to {}", self.page, clamped);
        }
        self.page = clamped;
    }
}
