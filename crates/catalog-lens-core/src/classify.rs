use crate::catalog::CatalogEntry;
use crate::matcher::{matches, tokenize_label, TokenSet};
use crate::taxonomy::{CategoryRule, DisplayText, RuleGroup, Taxonomy, TaxonomyStore};
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// How several selected categories of one group combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The entry matches at least one selected category.
    #[default]
    Any,
    /// The entry matches every selected category.
    All,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(format!("unknown match mode '{}'", other)),
        }
    }
}

/// Entry type plus category keys selected per group. Empty groups do not
/// filter; a blank entry type does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    /// Exact entry type, compared case-sensitively.
    pub entry_type: Option<String>,
    pub media: Vec<String>,
    pub characters: Vec<String>,
    pub tags: Vec<String>,
}

impl CategorySelection {
    pub fn keys(&self, group: RuleGroup) -> &[String] {
        match group {
            RuleGroup::Media => &self.media,
            RuleGroup::Character => &self.characters,
            RuleGroup::Tag => &self.tags,
        }
    }

    pub fn entry_type(&self) -> Option<&str> {
        self.entry_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entry_type().is_none()
            && self.media.is_empty()
            && self.characters.is_empty()
            && self.tags.is_empty()
    }
}

/// Category keys a label belongs to, per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub media: Vec<String>,
    pub characters: Vec<String>,
    pub tags: Vec<String>,
}

/// A ready-made navigation link into a filtered search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShortcut {
    pub group: RuleGroup,
    pub key: String,
    pub display: DisplayText,
    pub query_param: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl CategoryShortcut {
    /// `param=key`, ready to append to a search URL.
    pub fn query(&self) -> String {
        format!("{}={}", self.query_param, self.key)
    }
}

/// Per-category entry counts for one entry set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: AHashMap<(RuleGroup, String), usize>,
}

impl CategoryCounts {
    pub fn get(&self, group: RuleGroup, key: &str) -> Option<usize> {
        self.counts.get(&(group, key.to_string())).copied()
    }

    fn merge(mut self, other: CategoryCounts) -> CategoryCounts {
        for (k, v) in other.counts {
            *self.counts.entry(k).or_insert(0) += v;
        }
        self
    }
}

/// Answers category questions against the store's current taxonomy.
///
/// Classification never waits for overrides; until they merge, the built-in
/// rules are used.
#[derive(Clone)]
pub struct Classifier {
    store: Arc<TaxonomyStore>,
}

impl Classifier {
    pub fn new(store: Arc<TaxonomyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaxonomyStore> {
        &self.store
    }

    pub fn classify(&self, label: &str) -> Classification {
        let tokens = tokenize_label(label);
        self.store.with_taxonomy(|taxonomy| Classification {
            media: matching_keys(taxonomy.group(RuleGroup::Media), label, &tokens),
            characters: matching_keys(taxonomy.group(RuleGroup::Character), label, &tokens),
            tags: matching_keys(taxonomy.group(RuleGroup::Tag), label, &tokens),
        })
    }

    /// Unknown keys never match.
    pub fn belongs_to(&self, label: &str, group: RuleGroup, key: &str) -> bool {
        self.store.with_taxonomy(|taxonomy| {
            taxonomy
                .find(group, key)
                .map(|rule| matches(label, rule, None))
                .unwrap_or(false)
        })
    }

    /// Keep entries of the selected type that satisfy every group's selection.
    ///
    /// The type filter runs before any category group. Selected keys unknown
    /// to the taxonomy are ignored; a group whose selection resolves to
    /// nothing passes every entry.
    pub fn filter_entries(
        &self,
        entries: &[CatalogEntry],
        selection: &CategorySelection,
        mode: MatchMode,
    ) -> Vec<CatalogEntry> {
        if selection.is_empty() {
            return entries.to_vec();
        }
        let taxonomy = self.store.snapshot();
        let resolved: Vec<Vec<&CategoryRule>> = RuleGroup::ALL
            .iter()
            .map(|group| {
                selection
                    .keys(*group)
                    .iter()
                    .filter_map(|key| taxonomy.find(*group, key))
                    .collect()
            })
            .collect();

        let kept: Vec<CatalogEntry> = entries
            .iter()
            .filter(|entry| {
                selection
                    .entry_type()
                    .map_or(true, |wanted| entry.entry_type == wanted)
            })
            .filter(|entry| {
                let tokens = tokenize_label(&entry.label);
                resolved
                    .iter()
                    .all(|rules| group_match(&entry.label, &tokens, rules, mode))
            })
            .cloned()
            .collect();
        debug!("Category filter kept {} of {} entries", kept.len(), entries.len());
        kept
    }

    /// Count entries per category across all groups, in parallel.
    pub fn category_counts(&self, entries: &[CatalogEntry]) -> CategoryCounts {
        let taxonomy = self.store.snapshot();
        let seeded = zero_counts(&taxonomy);
        entries
            .par_iter()
            .fold(CategoryCounts::default, |mut acc, entry| {
                let tokens = tokenize_label(&entry.label);
                for group in RuleGroup::ALL {
                    for rule in taxonomy.group(group) {
                        if matches(&entry.label, rule, Some(&tokens)) {
                            *acc.counts.entry((group, rule.key().to_string())).or_insert(0) += 1;
                        }
                    }
                }
                acc
            })
            .reduce(CategoryCounts::default, CategoryCounts::merge)
            .merge(seeded)
    }

    /// Shortcut links for every category of `group`, annotated with counts
    /// when supplied.
    pub fn shortcuts(&self, group: RuleGroup, counts: Option<&CategoryCounts>) -> Vec<CategoryShortcut> {
        self.store.with_taxonomy(|taxonomy| {
            taxonomy
                .group(group)
                .iter()
                .map(|rule| CategoryShortcut {
                    group,
                    key: rule.key().to_string(),
                    display: rule.display().clone(),
                    query_param: group.query_param(),
                    count: counts.and_then(|c| c.get(group, rule.key())),
                })
                .collect()
        })
    }
}

fn matching_keys(rules: &[CategoryRule], label: &str, tokens: &TokenSet) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| matches(label, rule, Some(tokens)))
        .map(|rule| rule.key().to_string())
        .collect()
}

fn group_match(label: &str, tokens: &TokenSet, rules: &[&CategoryRule], mode: MatchMode) -> bool {
    if rules.is_empty() {
        return true;
    }
    match mode {
        MatchMode::Any => rules.iter().any(|rule| matches(label, rule, Some(tokens))),
        MatchMode::All => rules.iter().all(|rule| matches(label, rule, Some(tokens))),
    }
}

fn zero_counts(taxonomy: &Taxonomy) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for group in RuleGroup::ALL {
        for rule in taxonomy.group(group) {
            counts.counts.insert((group, rule.key().to_string()), 0);
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(TaxonomyStore::builtin()))
    }

    #[test]
    fn test_classify_image_label() {
        let result = classifier().classify("IMAGE_portrait01.png");
        assert_eq!(result.media, vec!["image".to_string()]);
        assert!(result.characters.is_empty());
    }

    #[test]
    fn test_classify_multiple_groups() {
        let result = classifier().classify("vo_kaho_skill2_01.acb");
        assert_eq!(result.media, vec!["audio".to_string()]);
        assert_eq!(result.characters, vec!["kaho".to_string()]);
        assert_eq!(result.tags, vec!["skill".to_string()]);
    }

    #[test]
    fn test_belongs_to_unknown_key() {
        assert!(!classifier().belongs_to("image_a", RuleGroup::Media, "hologram"));
        assert!(classifier().belongs_to("image_a", RuleGroup::Media, "image"));
    }

    #[test]
    fn test_type_filter_runs_before_groups() {
        let entries = vec![
            CatalogEntry::new("vo_kaho_01.acb", "CriAudio", 10),
            CatalogEntry::new("vo_kaho_02.acb", "AudioClip", 10),
            CatalogEntry::new("image_kaho_card", "Texture2D", 10),
        ];
        let selection = CategorySelection {
            entry_type: Some("CriAudio".to_string()),
            characters: vec!["kaho".to_string()],
            ..Default::default()
        };
        let kept = classifier().filter_entries(&entries, &selection, MatchMode::Any);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "vo_kaho_01.acb");

        let type_only = CategorySelection {
            entry_type: Some("Texture2D".to_string()),
            ..Default::default()
        };
        assert!(!type_only.is_empty());
        assert_eq!(classifier().filter_entries(&entries, &type_only, MatchMode::All).len(), 1);

        let blank = CategorySelection {
            entry_type: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert_eq!(classifier().filter_entries(&entries, &blank, MatchMode::Any).len(), 3);

        let case_differs = CategorySelection {
            entry_type: Some("criaudio".to_string()),
            ..Default::default()
        };
        assert!(classifier().filter_entries(&entries, &case_differs, MatchMode::Any).is_empty());
    }

    #[test]
    fn test_shortcuts_carry_query_param() {
        let shortcuts = classifier().shortcuts(RuleGroup::Tag, None);
        assert_eq!(shortcuts.len(), 6);
        assert_eq!(shortcuts[0].query(), "tags=skill");
        assert_eq!(
            shortcuts[0].display,
            DisplayText::LookupKey("filters.tag.skill".to_string())
        );
    }
}
