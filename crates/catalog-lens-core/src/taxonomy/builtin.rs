use super::{CategoryRule, DisplayText, Pattern, Taxonomy};
use tracing::warn;

/// One row of the built-in rule table.
struct RuleSpec {
    key: &'static str,
    display: Display,
    patterns: &'static [&'static str],
    tokens: &'static [&'static str],
}

enum Display {
    Label(&'static str),
    LookupKey(&'static str),
}

const fn media(key: &'static str, lookup: &'static str, patterns: &'static [&'static str]) -> RuleSpec {
    RuleSpec {
        key,
        display: Display::LookupKey(lookup),
        patterns,
        tokens: &[],
    }
}

const fn character(key: &'static str, label: &'static str, patterns: &'static [&'static str]) -> RuleSpec {
    RuleSpec {
        key,
        display: Display::Label(label),
        patterns,
        tokens: &[],
    }
}

const fn tag(
    key: &'static str,
    lookup: &'static str,
    patterns: &'static [&'static str],
    tokens: &'static [&'static str],
) -> RuleSpec {
    RuleSpec {
        key,
        display: Display::LookupKey(lookup),
        patterns,
        tokens,
    }
}

const MEDIA: &[RuleSpec] = &[
    media(
        "image",
        "filters.media.image",
        &["^image_", "^icon_", "^spriteasset_", "^ui_", "^launcher_"],
    ),
    media(
        "video",
        "filters.media.video",
        &[r"\.usm$", "^music_lyric_video_", "^picture_"],
    ),
    media(
        "audio",
        "filters.media.audio",
        &["^bgm_", "^vo_", "^se_", "^music_", r"\.acb$", r"\.awb$"],
    ),
    media(
        "model",
        "filters.media.model",
        &["^3d_", "^ingame_", r"\.playable\.assetbundle$"],
    ),
    media(
        "motion",
        "filters.media.motion",
        &["^mot_", r"\.anim\.assetbundle$", r"\.controller\.assetbundle$"],
    ),
    media(
        "story",
        "filters.media.story",
        &["^story_", r"\.txt$", "^quest_", "^section_"],
    ),
    media(
        "chart",
        "filters.media.chart",
        &["^rhythmgame_", "^musicscore_", r"\.bytes$", r"\.csv$"],
    ),
];

const CHARACTERS: &[RuleSpec] = &[
    character("kaho", "Kaho", &["(^|[_-])kaho([_.-]|$)"]),
    character("sayaka", "Sayaka", &["(^|[_-])sayaka([_.-]|$)"]),
    character("tsuzuri", "Tsuzuri", &["(^|[_-])tsuzuri([_.-]|$)"]),
    character("megumi", "Megumi", &["(^|[_-])megumi([_.-]|$)"]),
    character("ginko", "Ginko", &["(^|[_-])ginko([_.-]|$)"]),
    character("rurino", "Rurino", &["(^|[_-])rurino([_.-]|$)"]),
    character("kozue", "Kozue", &["(^|[_-])kozue([_.-]|$)"]),
    character("hime", "Hime", &["(^|[_-])hime([_.-]|$)"]),
];

const TAGS: &[RuleSpec] = &[
    tag("skill", "filters.tag.skill", &["(^|[_-])skill([_.-]|$)"], &["skill"]),
    tag("middle", "filters.tag.middle", &["(^|[_-])middle([_.-]|$)"], &["middle"]),
    tag("full", "filters.tag.full", &["(^|[_-])full([_.-]|$)"], &["full"]),
    tag("half", "filters.tag.half", &["(^|[_-])half([_.-]|$)"], &["half"]),
    tag("season", "filters.tag.season", &["(^|[_-])season([_.-]|$)"], &["season"]),
    tag("adv", "filters.tag.adv", &["(^|[_-])adv([_.-]|$)"], &["adv"]),
];

/// The taxonomy every store starts from before server overrides arrive.
pub fn builtin_taxonomy() -> Taxonomy {
    Taxonomy {
        media: build_rules(MEDIA),
        characters: build_rules(CHARACTERS),
        tags: build_rules(TAGS),
    }
}

fn build_rules(specs: &[RuleSpec]) -> Vec<CategoryRule> {
    specs.iter().map(build_rule).collect()
}

fn build_rule(spec: &RuleSpec) -> CategoryRule {
    let patterns = spec
        .patterns
        .iter()
        .filter_map(|source| match Pattern::new(source) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Skipping invalid pattern '{}' for '{}': {}", source, spec.key, e);
                None
            }
        })
        .collect();
    let tokens = spec.tokens.iter().map(|t| t.to_string()).collect();
    let display = match spec.display {
        Display::Label(label) => DisplayText::Label(label.to_string()),
        Display::LookupKey(key) => DisplayText::LookupKey(key.to_string()),
    };
    CategoryRule::new(spec.key, "", patterns, tokens).with_display(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::RuleGroup;

    #[test]
    fn test_builtin_group_sizes() {
        let taxonomy = builtin_taxonomy();
        assert_eq!(taxonomy.media.len(), 7);
        assert_eq!(taxonomy.characters.len(), 8);
        assert_eq!(taxonomy.tags.len(), 6);
    }

    #[test]
    fn test_builtin_patterns_all_compile() {
        let pattern_count: usize = MEDIA
            .iter()
            .chain(CHARACTERS)
            .chain(TAGS)
            .map(|spec| spec.patterns.len())
            .sum();
        let taxonomy = builtin_taxonomy();
        let compiled: usize = RuleGroup::ALL
            .iter()
            .flat_map(|g| taxonomy.group(*g))
            .map(|rule| rule.patterns().len())
            .sum();
        assert_eq!(pattern_count, compiled);
    }

    #[test]
    fn test_builtin_keys_unique_per_group() {
        let taxonomy = builtin_taxonomy();
        for group in RuleGroup::ALL {
            let mut keys: Vec<&str> = taxonomy.group(group).iter().map(|r| r.key()).collect();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(before, keys.len(), "duplicate key in {}", group);
        }
    }
}
