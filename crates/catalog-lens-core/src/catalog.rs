use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A catalog record as delivered by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub label: String,
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub resource_type: u32,
    #[serde(default)]
    pub real_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl CatalogEntry {
    pub fn new(label: &str, entry_type: &str, size: u64) -> Self {
        Self {
            label: label.to_string(),
            entry_type: entry_type.to_string(),
            size,
            resource_type: 0,
            real_name: String::new(),
            modified_at: None,
            categories: Vec::new(),
            content_types: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Timestamps of zero or below mean "unknown".
    pub fn modified_at(&self) -> Option<i64> {
        self.modified_at.filter(|ts| *ts > 0)
    }
}

/// Which part of an entry a keyword search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    All,
    Label,
    Type,
    Dependencies,
    Content,
    Categories,
    Name,
}

impl FromStr for SearchField {
    type Err = String;

    /// Unknown field names fall back to searching everything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "label" => SearchField::Label,
            "type" => SearchField::Type,
            "dependencies" | "deps" => SearchField::Dependencies,
            "content" | "contenttypes" => SearchField::Content,
            "categories" => SearchField::Categories,
            "realname" | "name" => SearchField::Name,
            _ => SearchField::All,
        })
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchField::All => "all",
            SearchField::Label => "label",
            SearchField::Type => "type",
            SearchField::Dependencies => "deps",
            SearchField::Content => "content",
            SearchField::Categories => "categories",
            SearchField::Name => "name",
        };
        f.write_str(name)
    }
}

fn haystack(entry: &CatalogEntry, field: SearchField) -> String {
    let parts: Vec<String> = match field {
        SearchField::All => vec![
            entry.label.clone(),
            entry.entry_type.clone(),
            entry.real_name.clone(),
            entry.content_types.join(" "),
            entry.categories.join(" "),
            entry.dependencies.join(" "),
        ],
        SearchField::Label => vec![entry.label.clone()],
        SearchField::Type => vec![entry.entry_type.clone()],
        SearchField::Dependencies => vec![entry.dependencies.join(" ")],
        SearchField::Content => vec![entry.content_types.join(" ")],
        SearchField::Categories => vec![entry.categories.join(" ")],
        SearchField::Name => vec![entry.real_name.clone()],
    };
    parts.join(" ").to_lowercase()
}

/// Keep entries whose chosen field contains every whitespace-separated term
/// of `query`, case-insensitively. A blank query keeps everything.
pub fn search_entries(entries: &[CatalogEntry], query: &str, field: SearchField) -> Vec<CatalogEntry> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect();
    if terms.is_empty() {
        return entries.to_vec();
    }

    entries
        .iter()
        .filter(|entry| {
            let text = haystack(entry, field);
            terms.iter().all(|term| text.contains(term.as_str()))
        })
        .cloned()
        .collect()
}

/// Distinct non-empty entry types, sorted, for a type picker.
pub fn entry_types(entries: &[CatalogEntry]) -> Vec<String> {
    let types: BTreeSet<&str> = entries
        .iter()
        .map(|entry| entry.entry_type.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    types.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<CatalogEntry> {
        let mut voice = CatalogEntry::new("vo_kaho_0001", "CriAudio", 2048);
        voice.real_name = "Kaho greeting".to_string();
        let mut image = CatalogEntry::new("image_card_kaho", "Texture2D", 4096);
        image.dependencies = vec!["shader_common".to_string()];
        vec![voice, image, CatalogEntry::new("bgm_title", "CriAudio", 9000)]
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        assert_eq!(search_entries(&entries(), "   ", SearchField::All).len(), 3);
    }

    #[test]
    fn test_every_term_must_match() {
        let found = search_entries(&entries(), "KAHO audio", SearchField::All);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "vo_kaho_0001");
    }

    #[test]
    fn test_field_restricts_haystack() {
        assert!(search_entries(&entries(), "shader", SearchField::Label).is_empty());
        assert_eq!(search_entries(&entries(), "shader", SearchField::Dependencies).len(), 1);
        assert_eq!(search_entries(&entries(), "greeting", SearchField::Name).len(), 1);
    }

    #[test]
    fn test_entry_types_distinct_sorted() {
        let mut list = entries();
        list.push(CatalogEntry::new("blank", "", 1));
        assert_eq!(entry_types(&list), vec!["CriAudio".to_string(), "Texture2D".to_string()]);
    }

    #[test]
    fn test_field_parse_fallback() {
        assert_eq!("deps".parse::<SearchField>().unwrap(), SearchField::Dependencies);
        assert_eq!("nonsense".parse::<SearchField>().unwrap(), SearchField::All);
    }

    #[test]
    fn test_entry_decodes_search_payload() {
        let json = r#"{"label":"ui_top","type":"Sprite","size":12,"resourceType":3,"realName":"Top","modifiedAt":0}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.entry_type, "Sprite");
        assert_eq!(entry.resource_type, 3);
        assert_eq!(entry.modified_at(), None);
    }
}
