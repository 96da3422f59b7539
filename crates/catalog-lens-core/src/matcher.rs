use crate::taxonomy::CategoryRule;
use ahash::AHashSet;

/// Lower-cased label fragments used for token matching.
///
/// Built once per label and reused across every rule a label is tested
/// against, since tokenizing is the expensive part of a category scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: AHashSet<String>,
}

impl TokenSet {
    pub fn from_label(label: &str) -> Self {
        tokenize_label(label)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Tokens in lexical order, for stable display and comparisons in tests.
    pub fn sorted(&self) -> Vec<String> {
        let mut out: Vec<String> = self.tokens.iter().cloned().collect();
        out.sort();
        out
    }
}

/// Split a label into lower-case alphanumeric runs.
///
/// Each run is kept as-is, and a second variant with trailing digits removed
/// is added when it differs, so `skill2` yields both `skill2` and `skill`.
pub fn tokenize_label(label: &str) -> TokenSet {
    let lowered = label.to_lowercase();
    let mut tokens = AHashSet::new();

    for part in lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
    {
        let stripped = part.trim_end_matches(|c: char| c.is_ascii_digit());
        if !stripped.is_empty() && stripped != part {
            tokens.insert(stripped.to_string());
        }
        tokens.insert(part.to_string());
    }

    TokenSet { tokens }
}

/// Decide whether `label` belongs to `rule`.
///
/// Patterns are tried first and short-circuit on the first hit. When none hit,
/// the label's token set (from `tokens` if the caller already built one) is
/// checked for any of the rule's tokens. A rule with neither patterns nor
/// tokens matches every label.
pub fn matches(label: &str, rule: &CategoryRule, tokens: Option<&TokenSet>) -> bool {
    if rule.is_wildcard() {
        return true;
    }

    if rule.patterns().iter().any(|pattern| pattern.is_match(label)) {
        return true;
    }

    if rule.tokens().is_empty() {
        return false;
    }

    match tokens {
        Some(set) => rule.tokens().iter().any(|token| set.contains(token)),
        None => {
            let set = tokenize_label(label);
            rule.tokens().iter().any(|token| set.contains(token))
        }
    }
}
