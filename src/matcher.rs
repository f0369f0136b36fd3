// Keyword matcher - scans one text field against a compiled dictionary
use crate::keywords::{KeywordDictionary, PatternKind};
use colored::Colorize;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One keyword hit inside a text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Text as it appears in the source, original casing kept
    pub matched_text: String,
    pub category: String,
    /// Column the text came from; empty when matching free text
    pub column: String,
    /// Character index (not byte offset) of the first matched character
    pub position: usize,
}

/// A dictionary pattern that failed to compile and is skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    pub category: String,
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
enum CompiledPattern {
    /// Escaped literal; only the first occurrence counts
    Literal(Regex),
    /// Every non-overlapping match counts
    Regex(Regex),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    category: String,
    pattern: CompiledPattern,
}

/// Compiled form of a [`KeywordDictionary`], built once and reused per cell
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: Vec<CompiledRule>,
    rejected: Vec<RejectedPattern>,
}

impl Matcher {
    pub fn new(dictionary: &KeywordDictionary) -> Self {
        let mut rules = Vec::with_capacity(dictionary.len());
        let mut rejected = Vec::new();

        for rule in dictionary.rules() {
            let source = match rule.pattern.kind {
                PatternKind::Literal => regex::escape(&rule.pattern.text),
                PatternKind::Regex => rule.pattern.text.clone(),
            };

            match RegexBuilder::new(&source).case_insensitive(true).build() {
                Ok(regex) => {
                    let pattern = match rule.pattern.kind {
                        PatternKind::Literal => CompiledPattern::Literal(regex),
                        PatternKind::Regex => CompiledPattern::Regex(regex),
                    };
                    rules.push(CompiledRule {
                        category: rule.category.to_string(),
                        pattern,
                    });
                }
                Err(e) => {
                    warn!(
                        "Skipping invalid pattern '{}' in category '{}': {}",
                        rule.pattern.text, rule.category, e
                    );
                    rejected.push(RejectedPattern {
                        category: rule.category.to_string(),
                        pattern: rule.pattern.text.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self { rules, rejected }
    }

    /// Patterns that could not be compiled
    pub fn rejected(&self) -> &[RejectedPattern] {
        &self.rejected
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Find every dictionary hit in `text`, ordered by position.
    ///
    /// Ties at the same position keep dictionary order.
    pub fn find_matches(&self, text: &str) -> Vec<MatchResult> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut found = Vec::new();
        for rule in &self.rules {
            match &rule.pattern {
                CompiledPattern::Literal(regex) => {
                    if let Some(m) = regex.find(text) {
                        found.push(hit(&rule.category, text, m));
                    }
                }
                CompiledPattern::Regex(regex) => {
                    found.extend(regex.find_iter(text).map(|m| hit(&rule.category, text, m)));
                }
            }
        }

        // sort_by_key is stable
        found.sort_by_key(|m| m.position);
        found
    }

    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty()
            && self.rules.iter().any(|rule| match &rule.pattern {
                CompiledPattern::Literal(regex) | CompiledPattern::Regex(regex) => {
                    regex.is_match(text)
                }
            })
    }
}

fn hit(category: &str, text: &str, m: regex::Match<'_>) -> MatchResult {
    MatchResult {
        matched_text: m.as_str().to_string(),
        category: category.to_string(),
        column: String::new(),
        position: text[..m.start()].chars().count(),
    }
}

/// Byte offset of the character at `position`
fn byte_offset(text: &str, position: usize) -> Option<usize> {
    text.char_indices().nth(position).map(|(offset, _)| offset)
}

/// Marker style for [`highlight`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    /// `<mark>..</mark>` tags, for reports
    Mark,
    /// Red bold ANSI, for the terminal
    Terminal,
}

/// Wrap matched spans of `text` in markers.
///
/// Overlapping matches are merged into one span.
pub fn highlight(text: &str, matches: &[MatchResult], style: HighlightStyle) -> String {
    let mut spans: Vec<(usize, usize)> = matches
        .iter()
        .filter_map(|m| {
            let start = byte_offset(text, m.position)?;
            let end = start + m.matched_text.len();
            text.get(start..end)?;
            Some((start, end))
        })
        .collect();
    spans.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut out = String::with_capacity(text.len() + merged.len() * 13);
    let mut cursor = 0;
    for (start, end) in merged {
        out.push_str(&text[cursor..start]);
        let span = &text[start..end];
        match style {
            HighlightStyle::Mark => {
                out.push_str("<mark>");
                out.push_str(span);
                out.push_str("</mark>");
            }
            HighlightStyle::Terminal => out.push_str(&span.red().bold().to_string()),
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}
