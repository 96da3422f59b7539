use super::builtin::builtin_taxonomy;
use super::{CategoryRule, OverrideDocument, Taxonomy};
use crate::source::CatalogSource;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Owns the live taxonomy.
///
/// Readers always see a complete taxonomy: the built-in table until the
/// server overrides have been merged, the merged one afterwards. The merge is
/// the only writer and applies under a single write lock.
pub struct TaxonomyStore {
    taxonomy: RwLock<Taxonomy>,
    overrides: OnceCell<()>,
}

impl Default for TaxonomyStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaxonomyStore {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy: RwLock::new(taxonomy),
            overrides: OnceCell::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_taxonomy())
    }

    /// Owned copy of the current rule set.
    pub fn snapshot(&self) -> Taxonomy {
        self.read().clone()
    }

    /// Run `f` against the current rule set without copying it.
    pub fn with_taxonomy<R>(&self, f: impl FnOnce(&Taxonomy) -> R) -> R {
        f(&self.read())
    }

    /// True once an override fetch has settled, successfully or not.
    pub fn overrides_settled(&self) -> bool {
        self.overrides.initialized()
    }

    /// Fetch the override document from `source` and merge it, at most once.
    ///
    /// Callers arriving while the fetch is in flight wait on the same fetch.
    /// A failed fetch is logged and leaves the taxonomy untouched.
    pub async fn load_overrides(&self, source: &dyn CatalogSource) {
        self.overrides
            .get_or_init(|| async {
                match source.fetch_overrides().await {
                    Ok(document) => self.merge_overrides(&document),
                    Err(e) => warn!("Taxonomy overrides unavailable, using built-ins: {}", e),
                }
            })
            .await;
    }

    /// Union server tokens into the rule set.
    ///
    /// Media keys unknown to the built-in table are ignored. Character tokens
    /// either extend the rule with the same lower-cased key or append a new
    /// rule for it. Applying the same document again changes nothing.
    pub fn merge_overrides(&self, document: &OverrideDocument) {
        let mut taxonomy = self.write();
        let mut added_tokens = 0usize;
        let mut added_rules = 0usize;

        for (key, tokens) in &document.media {
            match taxonomy.media.iter_mut().find(|rule| rule.key() == key.as_str()) {
                Some(rule) => added_tokens += rule.merge_tokens(tokens.iter().map(String::as_str)),
                None => debug!("Ignoring override for unknown media category '{}'", key),
            }
        }

        for token in &document.characters {
            let key = token.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            match taxonomy.characters.iter_mut().find(|rule| rule.key() == key.as_str()) {
                Some(rule) => added_tokens += rule.merge_tokens([key.as_str()]),
                None => {
                    taxonomy
                        .characters
                        .push(CategoryRule::new(&key, &key, Vec::new(), vec![key.clone()]));
                    added_rules += 1;
                }
            }
        }

        info!(
            "Merged taxonomy overrides: {} new tokens, {} new character rules",
            added_tokens, added_rules
        );
    }

    fn read(&self) -> RwLockReadGuard<'_, Taxonomy> {
        self.taxonomy.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Taxonomy> {
        self.taxonomy.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::RuleGroup;
    use std::collections::BTreeMap;

    fn doc(media: &[(&str, &[&str])], characters: &[&str]) -> OverrideDocument {
        OverrideDocument {
            media: media
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|t| t.to_string()).collect()))
                .collect::<BTreeMap<_, _>>(),
            characters: characters.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_existing_character_not_duplicated() {
        let store = TaxonomyStore::new(Taxonomy {
            characters: vec![CategoryRule::new("kaho", "Kaho", vec![], vec!["kaho".to_string()])],
            ..Taxonomy::default()
        });
        store.merge_overrides(&doc(&[], &["Kaho"]));

        let taxonomy = store.snapshot();
        assert_eq!(taxonomy.characters.len(), 1);
        let rule = taxonomy.find(RuleGroup::Character, "kaho").unwrap();
        assert_eq!(rule.tokens(), &["kaho".to_string()]);
        assert_eq!(rule.display().as_str(), "Kaho");
    }

    #[test]
    fn test_unknown_character_appends_rule() {
        let store = TaxonomyStore::builtin();
        let before = store.snapshot().characters.len();
        store.merge_overrides(&doc(&[], &["Izumi", ""]));

        let taxonomy = store.snapshot();
        assert_eq!(taxonomy.characters.len(), before + 1);
        let rule = taxonomy.characters.last().unwrap();
        assert_eq!(rule.key(), "izumi");
        assert_eq!(rule.display().as_str(), "izumi");
        assert_eq!(rule.tokens(), &["izumi".to_string()]);
        assert!(rule.patterns().is_empty());
    }

    #[test]
    fn test_unknown_media_key_ignored() {
        let store = TaxonomyStore::builtin();
        let before = store.snapshot();
        store.merge_overrides(&doc(&[("hologram", &["holo"])], &[]));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_media_tokens_unioned() {
        let store = TaxonomyStore::builtin();
        store.merge_overrides(&doc(&[("image", &["Thumb", "thumb", "card"])], &[]));
        let taxonomy = store.snapshot();
        let image = taxonomy.find(RuleGroup::Media, "image").unwrap();
        assert_eq!(image.tokens(), &["thumb".to_string(), "card".to_string()]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let document = doc(&[("audio", &["voice", "BGM"])], &["Kaho", "Izumi", "IZUMI"]);
        let once = TaxonomyStore::builtin();
        once.merge_overrides(&document);
        let twice = TaxonomyStore::builtin();
        twice.merge_overrides(&document);
        twice.merge_overrides(&document);
        assert_eq!(once.snapshot(), twice.snapshot());
    }
}
