// Row classifier - runs the matcher over the scanned columns of one record
use crate::matcher::{MatchResult, Matcher};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A record together with the keyword hits found in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub record: Record,
    /// Matched text in scan order, duplicates kept
    pub flagged_terms: Vec<String>,
    pub categories: BTreeSet<String>,
    pub match_count: usize,
    /// Scanned columns with at least one hit, in scan order
    pub locations: Vec<String>,
    pub matches: Vec<MatchResult>,
}

impl ClassifiedRecord {
    pub fn is_flagged(&self) -> bool {
        self.match_count > 0
    }
}

/// Classify one record.
///
/// Columns are scanned in the order given; columns the record lacks are
/// skipped. Never fails: every cell value has a text form.
pub fn classify(record: &Record, columns_to_scan: &[&str], matcher: &Matcher) -> ClassifiedRecord {
    let mut flagged_terms = Vec::new();
    let mut categories = BTreeSet::new();
    let mut locations = Vec::new();
    let mut matches = Vec::new();

    for column in columns_to_scan {
        let Some(value) = record.get(column) else {
            continue;
        };

        let text = value.to_string();
        let hits = matcher.find_matches(&text);
        if hits.is_empty() {
            continue;
        }

        if !locations.iter().any(|l: &String| l.as_str() == *column) {
            locations.push(column.to_string());
        }
        for mut hit in hits {
            flagged_terms.push(hit.matched_text.clone());
            categories.insert(hit.category.clone());
            hit.column = column.to_string();
            matches.push(hit);
        }
    }

    ClassifiedRecord {
        record: record.clone(),
        match_count: flagged_terms.len(),
        flagged_terms,
        categories,
        locations,
        matches,
    }
}
