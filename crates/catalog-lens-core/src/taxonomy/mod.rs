pub mod builtin;
pub mod store;

pub use store::TaxonomyStore;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A case-insensitive regular expression used by a category rule.
///
/// Compared by source text so whole taxonomies can be checked for equality.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/i", self.source)
    }
}

/// What the presentation layer shows for a rule: either literal text or a key
/// it resolves through its own localization tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayText {
    Label(String),
    LookupKey(String),
}

impl DisplayText {
    pub fn as_str(&self) -> &str {
        match self {
            DisplayText::Label(s) | DisplayText::LookupKey(s) => s,
        }
    }
}

/// A named membership predicate within one taxonomy group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    key: String,
    display: DisplayText,
    patterns: Vec<Pattern>,
    tokens: Vec<String>,
}

impl CategoryRule {
    pub fn new(key: &str, label: &str, patterns: Vec<Pattern>, tokens: Vec<String>) -> Self {
        Self {
            key: key.to_string(),
            display: DisplayText::Label(label.to_string()),
            patterns,
            tokens,
        }
    }

    pub fn with_display(mut self, display: DisplayText) -> Self {
        self.display = display;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display(&self) -> &DisplayText {
        &self.display
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Neither patterns nor tokens: the rule accepts every label.
    pub fn is_wildcard(&self) -> bool {
        self.patterns.is_empty() && self.tokens.is_empty()
    }

    /// Union `extra` into the token list, lower-cased, keeping first-seen order.
    /// Returns how many tokens were actually added.
    pub fn merge_tokens<'a, I>(&mut self, extra: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for token in extra {
            let token = token.trim().to_lowercase();
            if token.is_empty() || self.tokens.contains(&token) {
                continue;
            }
            self.tokens.push(token);
            added += 1;
        }
        added
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleGroup {
    Media,
    Character,
    Tag,
}

impl RuleGroup {
    pub const ALL: [RuleGroup; 3] = [RuleGroup::Media, RuleGroup::Character, RuleGroup::Tag];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleGroup::Media => "media",
            RuleGroup::Character => "character",
            RuleGroup::Tag => "tag",
        }
    }

    /// Name of the search query parameter that selects categories of this group.
    pub fn query_param(&self) -> &'static str {
        match self {
            RuleGroup::Media => "media",
            RuleGroup::Character => "character",
            RuleGroup::Tag => "tags",
        }
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "media" => Ok(RuleGroup::Media),
            "character" | "characters" => Ok(RuleGroup::Character),
            "tag" | "tags" => Ok(RuleGroup::Tag),
            other => Err(format!("unknown category group '{}'", other)),
        }
    }
}

/// Every category rule, split into the three independent groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    pub media: Vec<CategoryRule>,
    pub characters: Vec<CategoryRule>,
    pub tags: Vec<CategoryRule>,
}

impl Taxonomy {
    pub fn group(&self, group: RuleGroup) -> &[CategoryRule] {
        match group {
            RuleGroup::Media => &self.media,
            RuleGroup::Character => &self.characters,
            RuleGroup::Tag => &self.tags,
        }
    }

    pub fn find(&self, group: RuleGroup, key: &str) -> Option<&CategoryRule> {
        self.group(group).iter().find(|rule| rule.key == key)
    }

    pub fn rule_count(&self) -> usize {
        self.media.len() + self.characters.len() + self.tags.len()
    }
}

/// Server-supplied extensions to the built-in taxonomy.
///
/// ```json
/// { "media": { "image": ["thumb"] }, "characters": ["Kaho", "Izumi"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDocument {
    #[serde(default)]
    pub media: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub characters: Vec<String>,
}
