// Column aliases - canonical names for the headers of SEO tool exports
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

pub const SOURCE_URL: &str = "Source url";
pub const SOURCE_TITLE: &str = "Source title";
pub const TARGET_URL: &str = "Target url";
pub const ANCHOR: &str = "Anchor";
pub const PAGE_ASCORE: &str = "Page ascore";
pub const EXTERNAL_LINKS: &str = "External links";
pub const NOFOLLOW: &str = "Nofollow";
pub const REFERRING_DOMAIN: &str = "Referring Domain";
pub const DOMAIN_NAME: &str = "Name";
pub const SPAM_SCORE: &str = "SZ";
pub const DOMAIN_AGE: &str = "Age";
pub const MAJESTIC_TOPICS: &str = "MT";
pub const MOZ_DA: &str = "DA";
pub const AUTHORITY_SCORE: &str = "AS";
pub const DOMAIN_RATING: &str = "DR";

/// Authority metrics compared by the domain variance check
pub const AUTHORITY_METRICS: &[&str] = &[MOZ_DA, AUTHORITY_SCORE, DOMAIN_RATING];

/// Columns scanned for keywords in backlink exports
pub const DEFAULT_SCAN_COLUMNS: &[&str] = &[ANCHOR, SOURCE_TITLE, SOURCE_URL, REFERRING_DOMAIN];

const SEMRUSH_ALIASES: &[(&str, &str)] = &[
    ("Source URL", SOURCE_URL),
    ("Source Url", SOURCE_URL),
    ("Source", SOURCE_URL),
    ("Page AS", PAGE_ASCORE),
    ("Page Authority Score", PAGE_ASCORE),
    ("Authority Score", PAGE_ASCORE),
    ("AS", PAGE_ASCORE),
    ("Target", TARGET_URL),
    ("Target Url", TARGET_URL),
    ("Target URL", TARGET_URL),
    ("Title", SOURCE_TITLE),
    ("Source Title", SOURCE_TITLE),
    ("FirstSeen", "First seen"),
    ("First Seen", "First seen"),
    ("LastSeen", "Last seen"),
    ("Last Seen", "Last seen"),
    ("ExtBacklinks", EXTERNAL_LINKS),
    ("External Links", EXTERNAL_LINKS),
    ("External backlinks", EXTERNAL_LINKS),
    ("NoFollow", NOFOLLOW),
    ("No Follow", NOFOLLOW),
    ("SiteWide", "Sitewide"),
    ("Site Wide", "Sitewide"),
    ("Lost Link", "Lost link"),
    ("LostLink", "Lost link"),
];

const SPAMZILLA_ALIASES: &[(&str, &str)] = &[
    ("name", DOMAIN_NAME),
    ("Domain", DOMAIN_NAME),
    ("SZ Score", SPAM_SCORE),
    ("Majestic Topics", MAJESTIC_TOPICS),
    ("Moz DA", MOZ_DA),
    ("Authority Score", AUTHORITY_SCORE),
    ("Ahrefs DR", DOMAIN_RATING),
];

/// Alias -> canonical column name lookup, applied once when a table is read
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    map: HashMap<String, String>,
}

impl ColumnAliases {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut aliases = Self::new();
        for (alias, canonical) in pairs {
            aliases.add(alias, canonical);
        }
        aliases
    }

    /// Aliases for SEMRUSH backlink exports
    pub fn semrush() -> Self {
        Self::from_pairs(SEMRUSH_ALIASES)
    }

    /// Aliases for Spamzilla domain exports
    pub fn spamzilla() -> Self {
        Self::from_pairs(SPAMZILLA_ALIASES)
    }

    pub fn add(&mut self, alias: &str, canonical: &str) {
        self.map
            .insert(normalize_header(alias), canonical.to_string());
    }

    /// Canonical name for a raw header; unknown headers are only cleaned up
    pub fn canonical(&self, header: &str) -> String {
        let cleaned = normalize_header(header);
        match self.map.get(&cleaned) {
            Some(canonical) => canonical.clone(),
            None => cleaned,
        }
    }

    pub fn canonicalize_all(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.canonical(h)).collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::semrush()
    }
}

/// Strip a UTF-8 BOM, NFKC-normalize and trim a header
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .nfkc()
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_aliases() {
        let aliases = ColumnAliases::semrush();
        assert_eq!(aliases.canonical("Source URL"), "Source url");
        assert_eq!(aliases.canonical("Source Url"), "Source url");
        assert_eq!(aliases.canonical("Source url"), "Source url");
        assert_eq!(aliases.canonical("Source"), "Source url");
    }

    #[test]
    fn test_other_semrush_aliases() {
        let aliases = ColumnAliases::semrush();
        assert_eq!(aliases.canonical("Page AS"), "Page ascore");
        assert_eq!(aliases.canonical("Title"), "Source title");
        assert_eq!(aliases.canonical("External Links"), "External links");
        assert_eq!(aliases.canonical("NoFollow"), "Nofollow");
        assert_eq!(aliases.canonical("LastSeen"), "Last seen");
    }

    #[test]
    fn test_spamzilla_aliases_leave_source_alone() {
        let aliases = ColumnAliases::spamzilla();
        assert_eq!(aliases.canonical("name"), "Name");
        assert_eq!(aliases.canonical("Source"), "Source");
        assert_eq!(aliases.canonical("SZ Score"), "SZ");
        assert_eq!(aliases.canonical("Authority Score"), "AS");
        assert_eq!(aliases.canonical("Majestic Topics"), "MT");
    }

    #[test]
    fn test_unknown_headers_pass_through_cleaned() {
        let aliases = ColumnAliases::semrush();
        assert_eq!(aliases.canonical("  Anchor "), "Anchor");
        assert_eq!(aliases.canonical("\u{feff}Page ascore"), "Page ascore");
        assert_eq!(aliases.canonical("Custom"), "Custom");
    }

    #[test]
    fn test_bom_and_fullwidth_are_normalized() {
        // fullwidth "AS" folds to ASCII under NFKC
        let aliases = ColumnAliases::semrush();
        assert_eq!(aliases.canonical("\u{feff}\u{ff21}\u{ff33}"), "Page ascore");
    }

    #[test]
    fn test_custom_alias() {
        let mut aliases = ColumnAliases::new();
        aliases.add("Link Text", "Anchor");
        assert_eq!(aliases.canonical("Link Text"), "Anchor");
        assert_eq!(aliases.len(), 1);
    }
}
