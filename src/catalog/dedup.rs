//! Catalog deduplication.
//!
//! Collapses alternate recordings of the same song into one canonical item:
//! 1. Drop whole albums whose name marks a non-studio release.
//! 2. Drop items whose name marks non-song content.
//! 3. Group what remains by normalized name and keep one representative.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Item;

/// Bumped whenever grouping rules change, so cached catalogs built by an
/// older version are discarded.
pub const DEDUP_SCHEMA_VERSION: u32 = 2;

/// Album-name substrings (case-insensitive) that exclude the whole album.
pub const DEFAULT_ALBUM_DENYLIST: &[&str] = &[
    "live",
    "concert",
    "tour",
    "remix",
    "instrumental",
    "karaoke",
    "rehearsal",
    "demo",
    "acoustic",
    "unplugged",
    "on stage",
    "in concert",
    "special performance",
];

/// Item-name substrings (case-insensitive) that mark non-song content.
pub const DEFAULT_ITEM_DENYLIST: &[&str] = &[
    "skit",
    "intro",
    "outro",
    "interlude",
    "(japanese ver",
    "(english ver",
    "(chinese ver",
    "(korean ver",
];

/// Exclusion lists applied before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRules {
    #[serde(default = "default_album_denylist")]
    pub album_denylist: Vec<String>,

    #[serde(default = "default_item_denylist")]
    pub item_denylist: Vec<String>,
}

fn default_album_denylist() -> Vec<String> {
    DEFAULT_ALBUM_DENYLIST.iter().map(|s| s.to_string()).collect()
}

fn default_item_denylist() -> Vec<String> {
    DEFAULT_ITEM_DENYLIST.iter().map(|s| s.to_string()).collect()
}

impl Default for DedupRules {
    fn default() -> Self {
        Self {
            album_denylist: default_album_denylist(),
            item_denylist: default_item_denylist(),
        }
    }
}

impl DedupRules {
    pub fn is_excluded_album(&self, album_name: &str) -> bool {
        contains_any(album_name, &self.album_denylist)
    }

    pub fn is_excluded_item(&self, item_name: &str) -> bool {
        contains_any(item_name, &self.item_denylist)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let lower = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| lower.contains(&needle.to_lowercase()))
}

fn bracketed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[(\[].*?[)\]]\s*").expect("valid bracket regex"))
}

fn dashed_feat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*-\s*(?:feat|ft)\b.*$").expect("valid feat regex"))
}

fn inline_feat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+(?:feat|ft)\.\s.*$").expect("valid feat regex"))
}

/// Grouping key for a raw item name.
///
/// Lowercases, drops every parenthesized or bracketed segment, drops a
/// trailing featured-artist credit and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let no_brackets = bracketed_re().replace_all(&lower, " ");
    let no_dashed = dashed_feat_re().replace(&no_brackets, "");
    let no_feat = inline_feat_re().replace(&no_dashed, "");
    no_feat.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the canonical member of a group.
///
/// Prefers members that do not match the item denylist; among equals the
/// shortest raw name wins and ties keep the earliest member.
fn pick_representative<'a>(group: &[&'a Item], rules: &DedupRules) -> &'a Item {
    let clean: Vec<&Item> = group
        .iter()
        .copied()
        .filter(|item| !rules.is_excluded_item(&item.name))
        .collect();
    let candidates: &[&Item] = if clean.is_empty() { group } else { &clean };

    let mut best = candidates[0];
    for &item in &candidates[1..] {
        if item.name.chars().count() < best.name.chars().count() {
            best = item;
        }
    }
    best
}

/// Reduce a raw catalog to one canonical item per logical song.
///
/// Output keeps the order in which each group was first seen; callers
/// shuffle before play.
pub fn deduplicate(items: &[Item], rules: &DedupRules) -> Vec<Item> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Item>> = HashMap::new();
    let mut dropped_albums = 0usize;
    let mut dropped_items = 0usize;

    for item in items {
        if rules.is_excluded_album(&item.album_name) {
            dropped_albums += 1;
            continue;
        }
        if rules.is_excluded_item(&item.name) {
            dropped_items += 1;
            continue;
        }

        let key = normalize_name(&item.name);
        match groups.get_mut(&key) {
            Some(group) => group.push(item),
            None => {
                order.push(key.clone());
                groups.insert(key, vec![item]);
            }
        }
    }

    let canonical: Vec<Item> = order
        .iter()
        .filter_map(|key| groups.get(key))
        .map(|group| pick_representative(group, rules).clone())
        .collect();

    debug!(
        input = items.len(),
        dropped_albums,
        dropped_items,
        output = canonical.len(),
        "Deduplicated catalog"
    );

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use pretty_assertions::assert_eq;

    fn item(id: &str, name: &str, album: &str) -> Item {
        Item::new(ItemId::parse(id).unwrap(), name, album)
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Butter (Hotter Remix)"), "butter");
        assert_eq!(normalize_name("Dynamite [Tropical Remix]"), "dynamite");
        assert_eq!(normalize_name("My Universe - feat. Coldplay"), "my universe");
        assert_eq!(normalize_name("Life Goes On ft. Someone"), "life goes on");
        assert_eq!(normalize_name("  Spring   Day  "), "spring day");
        assert_eq!(normalize_name("Left and Right"), "left and right");
    }

    #[test]
    fn test_normalize_inner_brackets_keep_word_boundary() {
        assert_eq!(normalize_name("Song (Live) Version"), "song version");
    }

    #[test]
    fn test_album_exclusion() {
        let rules = DedupRules::default();
        assert!(rules.is_excluded_album("Love Yourself Tour (LIVE)"));
        assert!(rules.is_excluded_album("Map of the Soul ON:E Concert"));
        assert!(!rules.is_excluded_album("Proof"));
    }

    #[test]
    fn test_item_exclusion() {
        let rules = DedupRules::default();
        assert!(rules.is_excluded_item("Intro : Persona"));
        assert!(rules.is_excluded_item("Boy With Luv (Japanese Ver.)"));
        assert!(rules.is_excluded_item("Skit: Hesitation"));
        assert!(!rules.is_excluded_item("Fake Love"));
    }

    #[test]
    fn test_distinct_items_unchanged() {
        let rules = DedupRules::default();
        let input = vec![
            item("a", "Alpha", "One"),
            item("b", "Bravo", "One"),
            item("c", "Charlie", "Two"),
            item("d", "Delta", "Two"),
        ];
        assert_eq!(deduplicate(&input, &rules), input);
    }

    #[test]
    fn test_live_variant_collapses_to_studio_name() {
        let rules = DedupRules::default();
        let input = vec![item("1", "Song (Live)", "Hits"), item("2", "Song", "Hits")];

        let out = deduplicate(&input, &rules);
        assert_eq!(names(&out), vec!["Song"]);
        assert_eq!(out[0].id.as_str(), "2");
    }

    #[test]
    fn test_shortest_name_wins_first_on_tie() {
        let rules = DedupRules::default();
        let input = vec![
            item("1", "Butter (Hotter Remix)", "Butter"),
            item("2", "Butter (Sweeter)", "Butter"),
            item("3", "Butter [Cool]", "Butter"),
            item("4", "Butter [Sexy]", "Butter"),
        ];

        let out = deduplicate(&input, &rules);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_str(), "3");
    }

    #[test]
    fn test_whole_album_dropped() {
        let rules = DedupRules::default();
        let input = vec![
            item("1", "Fire", "The Most Beautiful Moment in Life: Young Forever"),
            item("2", "Fire", "BTS World Tour Live"),
            item("3", "Idol", "Love Yourself: Answer (Remix Edition)"),
        ];

        let out = deduplicate(&input, &rules);
        assert_eq!(names(&out), vec!["Fire"]);
        assert_eq!(out[0].id.as_str(), "1");
    }

    #[test]
    fn test_group_order_follows_first_appearance() {
        let rules = DedupRules::default();
        let input = vec![
            item("1", "Zeta", "A"),
            item("2", "Alpha", "A"),
            item("3", "Zeta (Slow)", "B"),
        ];
        assert_eq!(names(&deduplicate(&input, &rules)), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_custom_rules() {
        let rules = DedupRules {
            album_denylist: vec!["deluxe".to_string()],
            item_denylist: vec![],
        };
        let input = vec![item("1", "Intro", "Debut"), item("2", "Extra", "Debut DELUXE")];
        assert_eq!(names(&deduplicate(&input, &rules)), vec!["Intro"]);
    }

    #[test]
    fn test_representative_prefers_non_excluded_member() {
        let rules = DedupRules::default();
        let group_a = item("1", "Euphoria (Japanese Ver.)", "X");
        let group_b = item("2", "Euphoria (Theme of LOVE YOURSELF)", "X");
        let picked = pick_representative(&[&group_a, &group_b], &rules);
        assert_eq!(picked.id.as_str(), "2");
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let rules = DedupRules::default();
        let input = vec![
            item("1", "Song (Live)", "Hits"),
            item("2", "Song", "Hits"),
            item("3", "Other - feat. Guest", "Hits"),
            item("4", "Other", "Hits"),
            item("5", "Interlude: Shadow", "Hits"),
            item("6", "Third", "Live at Budokan"),
        ];

        let once = deduplicate(&input, &rules);
        let twice = deduplicate(&once, &rules);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(&[], &DedupRules::default()).is_empty());
    }
}
