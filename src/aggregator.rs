// Table aggregator - classifies every row and summarizes hits per category
use crate::classifier::{classify, ClassifiedRecord};
use crate::matcher::Matcher;
use crate::record::Record;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group value used for records whose group cell is missing or blank
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    /// Distinct group values among flagged records in this category
    pub domain_count: usize,
    /// Flagged records in this category; a record counts once per category
    pub record_count: usize,
}

/// A flagged record and its 1-based row number in the input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRecord {
    pub row_number: usize,
    pub classified: ClassifiedRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Flagged records in input order
    pub flagged: Vec<FlaggedRecord>,
    pub summaries: BTreeMap<String, CategorySummary>,
    pub total_records: usize,
}

impl Aggregation {
    pub fn flagged_records(&self) -> impl Iterator<Item = &ClassifiedRecord> {
        self.flagged.iter().map(|f| &f.classified)
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Text of the group column, or [`UNKNOWN_GROUP`] when the cell is missing or blank
pub fn group_value(record: &Record, group_key: &str) -> String {
    let text = record.text(group_key);
    if text.trim().is_empty() {
        UNKNOWN_GROUP.to_string()
    } else {
        text
    }
}

/// Number of distinct group values across a whole table
pub fn distinct_group_values(records: &[Record], group_key: &str) -> usize {
    records
        .iter()
        .map(|r| group_value(r, group_key))
        .collect::<FxHashSet<_>>()
        .len()
}

/// Classify `records`, keep the flagged ones and build per-category summaries
pub fn aggregate(
    records: &[Record],
    matcher: &Matcher,
    columns_to_scan: &[&str],
    group_key: &str,
) -> Aggregation {
    let mut flagged = Vec::new();
    let mut record_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut domains: BTreeMap<String, FxHashSet<String>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let classified = classify(record, columns_to_scan, matcher);
        if !classified.is_flagged() {
            continue;
        }

        let group = group_value(record, group_key);
        for category in &classified.categories {
            *record_counts.entry(category.clone()).or_insert(0) += 1;
            domains
                .entry(category.clone())
                .or_default()
                .insert(group.clone());
        }

        flagged.push(FlaggedRecord {
            row_number: index + 1,
            classified,
        });
    }

    let summaries = record_counts
        .into_iter()
        .map(|(category, record_count)| {
            let domain_count = domains.get(&category).map(|d| d.len()).unwrap_or(0);
            (
                category.clone(),
                CategorySummary {
                    category,
                    domain_count,
                    record_count,
                },
            )
        })
        .collect();

    Aggregation {
        flagged,
        summaries,
        total_records: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{content_keywords, KeywordDictionary, PatternKind};

    fn scenario_matcher() -> Matcher {
        Matcher::new(&KeywordDictionary::from_lists(
            PatternKind::Literal,
            &[("Adult", &["porn"]), ("Gambling", &["casino"])],
        ))
    }

    fn row(domain: &str, anchor: &str) -> Record {
        Record::new()
            .with("Referring Domain", domain)
            .with("Anchor", anchor)
    }

    #[test]
    fn test_reference_scenario() {
        let records = vec![
            row("a.com", "visit our casino today"),
            row("b.com", "clean text"),
            row("a.com", "porn and casino links"),
        ];
        let result = aggregate(&records, &scenario_matcher(), &["Anchor"], "Referring Domain");

        assert_eq!(result.total_records, 3);
        let rows: Vec<usize> = result.flagged.iter().map(|f| f.row_number).collect();
        assert_eq!(rows, vec![1, 3]);

        assert_eq!(
            result.summaries["Gambling"],
            CategorySummary {
                category: "Gambling".to_string(),
                domain_count: 1,
                record_count: 2,
            }
        );
        assert_eq!(
            result.summaries["Adult"],
            CategorySummary {
                category: "Adult".to_string(),
                domain_count: 1,
                record_count: 1,
            }
        );
        assert_eq!(result.summaries.len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let result = aggregate(&[], &scenario_matcher(), &["Anchor"], "Referring Domain");
        assert!(result.flagged.is_empty());
        assert!(result.summaries.is_empty());
        assert_eq!(result.total_records, 0);
    }

    #[test]
    fn test_order_is_preserved() {
        let records = vec![
            row("x.com", "casino"),
            row("y.com", "nothing here"),
            row("z.com", "porn"),
        ];
        let result = aggregate(&records, &scenario_matcher(), &["Anchor"], "Referring Domain");
        let flagged: Vec<&Record> = result.flagged_records().map(|c| &c.record).collect();
        assert_eq!(flagged, vec![&records[0], &records[2]]);
    }

    #[test]
    fn test_multi_category_record_counts_once_per_category() {
        let records = vec![row("a.com", "porn casino")];
        let result = aggregate(&records, &scenario_matcher(), &["Anchor"], "Referring Domain");
        assert_eq!(result.flagged.len(), 1);
        assert_eq!(result.summaries["Adult"].record_count, 1);
        assert_eq!(result.summaries["Gambling"].record_count, 1);
        assert_eq!(result.summaries["Adult"].domain_count, 1);
    }

    #[test]
    fn test_missing_group_key_groups_as_unknown() {
        let records = vec![
            Record::new().with("Anchor", "casino"),
            Record::new().with("Anchor", "casino again"),
            row("a.com", "casino"),
        ];
        let result = aggregate(&records, &scenario_matcher(), &["Anchor"], "Referring Domain");
        assert_eq!(result.summaries["Gambling"].domain_count, 2);
        assert_eq!(result.summaries["Gambling"].record_count, 3);
        assert_eq!(distinct_group_values(&records, "Referring Domain"), 2);
    }

    #[test]
    fn test_blank_group_cells_group_as_unknown() {
        let records = vec![
            row("", "casino one"),
            row("  ", "casino two"),
            row("a.com", "clean"),
        ];
        let result = aggregate(&records, &scenario_matcher(), &["Anchor"], "Referring Domain");
        assert_eq!(result.summaries["Gambling"].domain_count, 1);
        assert_eq!(group_value(&records[0], "Referring Domain"), UNKNOWN_GROUP);
        assert_eq!(distinct_group_values(&records, "Referring Domain"), 2);
    }

    #[test]
    fn test_domain_count_bounded_by_distinct_groups() {
        let matcher = Matcher::new(content_keywords());
        let records = vec![
            row("a.com", "online casino and poker"),
            row("b.com", "buy bitcoin now"),
            row("a.com", "cheap viagra"),
            row("c.com", "garden furniture"),
            row("d.com", "payday loan, bad credit ok"),
            row("b.com", "crypto casino"),
        ];
        let result = aggregate(&records, &matcher, &["Anchor"], "Referring Domain");
        let bound = distinct_group_values(&records, "Referring Domain");
        for summary in result.summaries.values() {
            assert!(summary.domain_count <= bound);
            assert!(summary.domain_count >= 1);
        }
        assert!(result
            .flagged_records()
            .all(|c| c.match_count > 0 && !c.flagged_terms.is_empty()));
    }
}
