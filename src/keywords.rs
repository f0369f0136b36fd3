// Keyword dictionaries - category -> patterns, each tagged literal or regex
use crate::error::{LinkvetError, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a pattern is matched against text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Case-insensitive substring containment, no word boundaries
    Literal,
    /// Case-insensitive regular expression search
    Regex,
}

impl PatternKind {
    pub fn name(&self) -> &str {
        match self {
            PatternKind::Literal => "literal",
            PatternKind::Regex => "regex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub text: String,
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::Literal,
            text: text.into(),
        }
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::Regex,
            text: text.into(),
        }
    }
}

/// A single (category, pattern) pair, the flat view of a dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule<'a> {
    pub category: &'a str,
    pub pattern: &'a Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub patterns: Vec<Pattern>,
}

/// Ordered mapping of category name to patterns.
///
/// Category order is significant: it breaks ties between matches that start at
/// the same position, so it is kept exactly as defined instead of sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordDictionary {
    categories: Vec<Category>,
}

impl KeywordDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary where every pattern has the same kind
    pub fn from_lists(kind: PatternKind, lists: &[(&str, &[&str])]) -> Self {
        let mut dictionary = Self::new();
        for (category, patterns) in lists {
            for text in *patterns {
                dictionary.add(
                    category,
                    Pattern {
                        kind,
                        text: (*text).to_string(),
                    },
                );
            }
        }
        dictionary
    }

    /// Append a pattern, creating the category at the end if it is new
    pub fn add(&mut self, category: &str, pattern: Pattern) {
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.patterns.push(pattern),
            None => self.categories.push(Category {
                name: category.to_string(),
                patterns: vec![pattern],
            }),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn patterns_for(&self, category: &str) -> &[Pattern] {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.patterns.as_slice())
            .unwrap_or(&[])
    }

    /// First category that defines this exact pattern text
    pub fn category_for(&self, pattern_text: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.patterns.iter().any(|p| p.text == pattern_text))
            .map(|c| c.name.as_str())
    }

    pub fn rules(&self) -> impl Iterator<Item = KeywordRule<'_>> {
        self.categories.iter().flat_map(|c| {
            c.patterns.iter().map(move |p| KeywordRule {
                category: c.name.as_str(),
                pattern: p,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.patterns.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a dictionary from its JSON file form
    pub fn from_json(json: &str) -> Result<Self> {
        let file: DictionaryFile = serde_json::from_str(json)?;
        let default_kind = file.kind.unwrap_or(PatternKind::Literal);

        let mut dictionary = Self::new();
        for category in file.categories {
            if category.name.trim().is_empty() {
                return Err(LinkvetError::Dictionary(
                    "category with an empty name".to_string(),
                ));
            }
            for entry in category.patterns {
                let pattern = match entry {
                    PatternEntry::Plain(text) => Pattern {
                        kind: default_kind,
                        text,
                    },
                    PatternEntry::Tagged(TaggedPattern::Literal(text)) => Pattern::literal(text),
                    PatternEntry::Tagged(TaggedPattern::Regex(text)) => Pattern::regex(text),
                };
                if pattern.text.is_empty() {
                    return Err(LinkvetError::Dictionary(format!(
                        "empty pattern in category '{}'",
                        category.name
                    )));
                }
                dictionary.add(&category.name, pattern);
            }
        }
        Ok(dictionary)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize with every pattern explicitly tagged
    pub fn to_json(&self) -> Result<String> {
        let file = DictionaryFile {
            kind: None,
            categories: self
                .categories
                .iter()
                .map(|c| CategoryEntry {
                    name: c.name.clone(),
                    patterns: c
                        .patterns
                        .iter()
                        .map(|p| {
                            PatternEntry::Tagged(match p.kind {
                                PatternKind::Literal => TaggedPattern::Literal(p.text.clone()),
                                PatternKind::Regex => TaggedPattern::Regex(p.text.clone()),
                            })
                        })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DictionaryFile {
    /// Kind applied to untagged pattern strings (literal when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<PatternKind>,
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryEntry {
    name: String,
    patterns: Vec<PatternEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum PatternEntry {
    Plain(String),
    Tagged(TaggedPattern),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedPattern {
    Literal(String),
    Regex(String),
}

lazy_static! {
    static ref CONTENT_KEYWORDS: KeywordDictionary = KeywordDictionary::from_lists(
        PatternKind::Regex,
        &[
            (
                "Adult",
                &[
                    r"\bxxx\b", r"\bporn\b", r"\badult\b", r"\bsex\b", r"\bescort\b",
                    r"\bdating\b", r"\bnude\b", r"\bnaked\b", r"\bviagra\b", r"\bcialis\b",
                    r"\badult\s+content\b", r"\bmature\s+content\b", r"\bescorts?\b",
                    r"\bstrip\s+club\b", r"\bstripper\b", r"\bbrothel\b", r"\bcasino\b",
                    r"\bgambling\b", r"\bbetting\b", r"\bxvideos\b", r"\bpornhub\b",
                    r"\bxhamster\b", r"\berotic\b",
                ],
            ),
            (
                "Gambling",
                &[
                    r"\bcasino\b", r"\bpoker\b", r"\bbet\b", r"\bbetting\b", r"\bgambling\b",
                    r"\blottery\b", r"\bslot\b", r"\bblackjack\b", r"\broulette\b",
                    r"\bwagering\b", r"\bsportsbook\b", r"\bbaccarat\b",
                    r"\bgames?\s+of\s+chance\b", r"\bbookmaker\b", r"\bspin\s+to\s+win\b",
                    r"\bjackpot\b", r"\bslot\s+machine\b", r"\bcasinoclub\b",
                    r"\bon\s?line\s+gambling\b", r"\bgamble\b", r"\blive\s+dealer\b",
                    r"\bbettors\b", r"\bbookies\b", r"\bpunters?\b",
                ],
            ),
            (
                "Pharmaceuticals",
                &[
                    r"\bpharmacy\b", r"\bdrug\b", r"\bprescription\b", r"\bmedication\b",
                    r"\bmed\b", r"\bpills\b", r"\bcheap\s+meds\b", r"\bbuy\s+medication\b",
                    r"\bonline\s+pharmacy\b", r"\bno\s+prescription\b",
                    r"\bdiscount\s+drugs\b", r"\bviagra\b", r"\bcialis\b", r"\bvalium\b",
                    r"\bxanax\b", r"\badderall\b", r"\britalin\b", r"\bpercocet\b",
                    r"\boxyco(ntin|done)\b", r"\bopioid\b", r"\bsteroids?\b", r"\bhgh\b",
                    r"\bhuman\s+growth\s+hormone\b", r"\banabolic\b",
                    r"\bweight\s+loss\s+pills\b",
                ],
            ),
            (
                "Fake News",
                &[
                    r"\bfake\s+news\b", r"\bconspiracy\b", r"\bhoax\b", r"\bclickbait\b",
                    r"\bpropaganda\b", r"\bdisinformation\b", r"\bmisinformation\b",
                    r"\bfact\s+check\b", r"\bdebunked\b", r"\bexposed\b",
                    r"\btape\s+they\s+don't\s+want\s+you\s+to\s+see\b",
                    r"\bshocking\s+truth\b", r"\blying\s+media\b", r"\bmedia\s+cover\s?up\b",
                    r"\b(hillary|obama|trump)\s+exposed\b", r"\bcensored\b",
                    r"\btruth\s+they\s+hide\b", r"\balternative\s+facts\b", r"\bfalsified\b",
                ],
            ),
            (
                "Hacking",
                &[
                    r"\bhack\b", r"\bcrack\b", r"\bwarez\b", r"\bkeygen\b", r"\bserial\b",
                    r"\bpirate\b", r"\btorrent\b", r"\bleaked\b", r"\bjailbreak\b",
                    r"\bbypass\b", r"\bnulled\b", r"\bstolen\b", r"\bpassword\s+crack",
                    r"\bsecurity\s+bypass\b", r"\bfree\s+download\s+(premium|paid)\b",
                    r"\bcyber\s+attack\b", r"\bhacker\b", r"\bbotnets?\b", r"\bmalware\b",
                    r"\brunkit\b", r"\bkeylogger\b", r"\bransomware\b", r"\bcybercrime\b",
                    r"\bvulnerabilit(y|ies)\b", r"\bexploit\b", r"\bbackdoor\b",
                    r"\bsql\s+injection\b", r"\bdark\s+web\b",
                ],
            ),
            (
                "Loans",
                &[
                    r"\bpayday\s+loan\b", r"\bquick\s+cash\b", r"\bfast\s+cash\b",
                    r"\beasy\s+money\b", r"\bquick\s+loan\b", r"\bcash\s+advance\b",
                    r"\bbad\s+credit\b", r"\bno\s+credit\s+check\b", r"\binstant\s+approval\b",
                    r"\bcredit\s+fix\b", r"\bcredit\s+repair\b", r"\bcash\s+now\b",
                    r"\bno\s+document\s+loans\b", r"\bno\s+verification\b",
                    r"\bapproved\s+in\s+minutes\b", r"\beasy\s+loans\s+online\b",
                    r"\bin\s+debt\b", r"\bdebt\s+consolidation\b", r"\bquick\s+approval\b",
                    r"\bno\s+hassle\s+loans\b",
                ],
            ),
            (
                "Crypto Scams",
                &[
                    r"\bcrypto\b", r"\bbitcoin\b", r"\binvestment\s+scheme\b",
                    r"\bdouble\s+your\s+money\b", r"\bguaranteed\s+return\b",
                    r"\b100%\s+profit\b", r"\binvestment\s+opportunity\b", r"\bblockchain\b",
                    r"\bico\b", r"\btoken\s+sale\b", r"\bcryptocurrency\b", r"\betherium\b",
                    r"\bdoge(coin)?\b", r"\bpassive\s+income\b", r"\bcrypto\s+mining\b",
                    r"\bnft\b", r"\btrade\s+crypto\b", r"\bcoin\s+offering\b",
                    r"\bbitcoin\s+profit\b", r"\bmining\s+opportunity\b",
                    r"\bcrypto\s+exchange\b", r"\bcrypto\s+investment\b",
                ],
            ),
            (
                "General Scams",
                &[
                    r"\bmake\s+money\s+fast\b", r"\bget\s+rich\s+quick\b",
                    r"\bwork\s+from\s+home\b", r"\bmiracle\b", r"\bsecret\b",
                    r"\bguaranteed\b", r"\bfree\s+money\b", r"\bhidden\b",
                    r"\bthey\s+don't\s+want\s+you\s+to\s+know\b", r"\bone\s+weird\s+trick\b",
                    r"\blose\s+weight\s+fast\b", r"\blife\s+hack\b", r"\binstant\s+results\b",
                    r"\bfree\s+trial\b", r"\blimited\s+time\s+offer\b",
                    r"\bexclusive\s+offer\b", r"\bact\s+now\b", r"\bonly\s+\$\d+\b",
                    r"\brisk[- ]free\b", r"\bclaim\s+your\b", r"\bgiveaway\b", r"\breward\b",
                    r"\bprize\b", r"\byou've\s+been\s+selected\b", r"\bwe\s+pay\s+you\b",
                    r"\beach\s+day\b", r"\bin\s+your\s+sleep\b",
                ],
            ),
        ],
    );

    static ref DOMAIN_KEYWORDS: KeywordDictionary = KeywordDictionary::from_lists(
        PatternKind::Literal,
        &[
            (
                "Adult",
                &[
                    "xxx", "porn", "adult", "sex", "escort", "dating", "nude", "naked",
                    "viagra", "cialis",
                ],
            ),
            (
                "Gambling",
                &[
                    "bet", "casino", "poker", "lotto", "lottery", "bingo", "jackpot",
                    "gamble", "wager", "bookie",
                ],
            ),
            (
                "Pharmaceutical",
                &[
                    "pharmacy", "drug", "prescription", "medication", "pill", "tablet",
                    "capsule", "antibiotic", "painkiller", "supplement",
                ],
            ),
        ],
    );

    static ref TOPIC_KEYWORDS: KeywordDictionary = KeywordDictionary::from_lists(
        PatternKind::Regex,
        &[
            (
                "Adult",
                &[
                    r"\badult\b", r"\bporn\b", r"\bxxx\b", r"\bsex\b", r"\berotic\b",
                    r"\bescort\b", r"\bdating\b", r"\bmature\b",
                ],
            ),
            (
                "Pharmaceutical",
                &[
                    r"\bpharmacy\b", r"\bdrug\b", r"\bpill\b", r"\bmedication\b",
                    r"\bprescription\b", r"\bmed\b", r"\bpharma\b", r"\bviagra\b",
                    r"\bcialis\b", r"\bsupplement\b", r"\bweight loss\b",
                ],
            ),
            (
                "Gambling",
                &[
                    r"\bcasino\b", r"\bgambling\b", r"\bbet\b", r"\bbetting\b", r"\bpoker\b",
                    r"\bslot\b", r"\bslots\b", r"\broulette\b", r"\bblackjack\b",
                    r"\blottery\b", r"\bwager\b", r"\bwagering\b", r"\bbingo\b",
                    r"\bbookmaker\b", r"\bsportsbook\b",
                ],
            ),
            (
                "Loans",
                &[
                    r"\bloan\b", r"\bpayday\b", r"\bcredit\b", r"\bdebt\b", r"\bmortgage\b",
                    r"\bfinance\b", r"\bcash advance\b", r"\bquick cash\b",
                    r"\bfast money\b", r"\beasy money\b", r"\bpawnshop\b",
                ],
            ),
            (
                "Questionable Practices",
                &[
                    r"\bhack\b", r"\bcrack\b", r"\bkeygen\b", r"\bwarez\b", r"\btorrent\b",
                    r"\bpirate\b", r"\bbootleg\b", r"\bcounterfeit\b", r"\bfake\b",
                    r"\breplica\b", r"\bpiracy\b", r"\bcheat\b",
                ],
            ),
            (
                "Political",
                &[
                    r"\bpolitic\b", r"\bracism\b", r"\bextremist\b", r"\bpartisan\b",
                    r"\bsupremacist\b", r"\bterrorist\b", r"\bpropaganda\b",
                    r"\bconspiracy\b", r"\bradical\b",
                ],
            ),
        ],
    );
}

/// Regex rule set for backlink anchors, titles and URLs
pub fn content_keywords() -> &'static KeywordDictionary {
    &CONTENT_KEYWORDS
}

/// Literal rule set for auction domain names
pub fn domain_keywords() -> &'static KeywordDictionary {
    &DOMAIN_KEYWORDS
}

/// Word-boundary rule set for the topic labels of domain exports
pub fn topic_keywords() -> &'static KeywordDictionary {
    &TOPIC_KEYWORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_category_order() {
        assert_eq!(
            content_keywords().category_names(),
            vec![
                "Adult",
                "Gambling",
                "Pharmaceuticals",
                "Fake News",
                "Hacking",
                "Loans",
                "Crypto Scams",
                "General Scams"
            ]
        );
        assert_eq!(
            domain_keywords().category_names(),
            vec!["Adult", "Gambling", "Pharmaceutical"]
        );
    }

    #[test]
    fn test_builtin_kinds() {
        assert!(content_keywords()
            .rules()
            .all(|r| r.pattern.kind == PatternKind::Regex));
        assert!(domain_keywords()
            .rules()
            .all(|r| r.pattern.kind == PatternKind::Literal));
        assert_eq!(domain_keywords().len(), 30);
    }

    #[test]
    fn test_topic_keywords_are_whole_words() {
        let dict = topic_keywords();
        assert!(dict.rules().all(|r| r.pattern.kind == PatternKind::Regex
            && r.pattern.text.starts_with(r"\b")
            && r.pattern.text.ends_with(r"\b")));
        assert_eq!(dict.category_for(r"\bcasino\b"), Some("Gambling"));
        assert_eq!(dict.category_names().len(), 6);
    }

    #[test]
    fn test_lookup_helpers() {
        let dict = domain_keywords();
        assert_eq!(dict.category_for("casino"), Some("Gambling"));
        assert_eq!(dict.category_for("nothing"), None);
        assert_eq!(dict.patterns_for("Adult").len(), 10);
        assert!(dict.patterns_for("Unknown").is_empty());
    }

    #[test]
    fn test_add_keeps_first_seen_order() {
        let mut dict = KeywordDictionary::new();
        dict.add("Zeta", Pattern::literal("z"));
        dict.add("Alpha", Pattern::literal("a"));
        dict.add("Zeta", Pattern::literal("zz"));
        assert_eq!(dict.category_names(), vec!["Zeta", "Alpha"]);
        assert_eq!(dict.patterns_for("Zeta").len(), 2);
    }

    #[test]
    fn test_from_json_default_and_tagged_kinds() {
        let json = r#"{
            "kind": "regex",
            "categories": [
                {"name": "Adult", "patterns": ["\\bporn\\b", {"literal": "xxx"}]},
                {"name": "Gambling", "patterns": [{"regex": "\\bcasino\\b"}]}
            ]
        }"#;
        let dict = KeywordDictionary::from_json(json).unwrap();
        assert_eq!(dict.category_names(), vec!["Adult", "Gambling"]);
        assert_eq!(dict.patterns_for("Adult")[0], Pattern::regex(r"\bporn\b"));
        assert_eq!(dict.patterns_for("Adult")[1], Pattern::literal("xxx"));
        assert_eq!(dict.patterns_for("Gambling")[0].kind, PatternKind::Regex);
    }

    #[test]
    fn test_from_json_untagged_defaults_to_literal() {
        let json = r#"{"categories": [{"name": "Adult", "patterns": ["sex"]}]}"#;
        let dict = KeywordDictionary::from_json(json).unwrap();
        assert_eq!(dict.patterns_for("Adult")[0].kind, PatternKind::Literal);
    }

    #[test]
    fn test_from_json_rejects_empty_pattern() {
        let json = r#"{"categories": [{"name": "Adult", "patterns": [""]}]}"#;
        assert!(matches!(
            KeywordDictionary::from_json(json),
            Err(LinkvetError::Dictionary(_))
        ));
    }

    #[test]
    fn test_json_export_reloads() {
        let json = domain_keywords().to_json().unwrap();
        let reloaded = KeywordDictionary::from_json(&json).unwrap();
        assert_eq!(&reloaded, domain_keywords());
    }
}
