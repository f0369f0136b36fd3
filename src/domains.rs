// Domain-name scan - flags expired-domain candidates whose names contain dodgy keywords
use crate::aggregator::aggregate;
use crate::columns::{
    ColumnAliases, AUTHORITY_METRICS, DOMAIN_AGE, DOMAIN_NAME, MAJESTIC_TOPICS, SPAM_SCORE,
};
use crate::error::{LinkvetError, Result};
use crate::keywords::{topic_keywords, KeywordDictionary};
use crate::matcher::Matcher;
use crate::record::Record;
use crate::table::Table;
use chrono::NaiveDate;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CLEANED_SUFFIX: &str = "_cleaned.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedDomain {
    /// Lowercased domain name
    pub domain: String,
    pub matched_keywords: Vec<String>,
    pub matched_categories: Vec<String>,
}

/// A domain with one or more spam signals from its export metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialSpam {
    pub domain: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamSignalSettings {
    /// Spamzilla score above this is a signal
    pub max_spam_score: f64,
    /// Domain age in years below this is a signal
    pub min_age_years: f64,
    /// Spread between DA, AS and DR above this is a signal
    pub max_metric_variance: f64,
}

impl Default for SpamSignalSettings {
    fn default() -> Self {
        Self {
            max_spam_score: 20.0,
            min_age_years: 0.5,
            max_metric_variance: 40.0,
        }
    }
}

/// Per-domain spam signals: prohibited Majestic topics, spam score, age and
/// authority metric variance
#[derive(Debug, Clone)]
pub struct SpamChecker {
    topics: Matcher,
    settings: SpamSignalSettings,
}

impl Default for SpamChecker {
    fn default() -> Self {
        Self::new(SpamSignalSettings::default())
    }
}

impl SpamChecker {
    pub fn new(settings: SpamSignalSettings) -> Self {
        Self {
            topics: Matcher::new(topic_keywords()),
            settings,
        }
    }

    /// Signals raised by one domain record, in check order
    pub fn reasons(&self, record: &Record) -> Vec<String> {
        let mut reasons = Vec::new();

        let mut topics: Vec<String> = Vec::new();
        for hit in self.topics.find_matches(&record.text(MAJESTIC_TOPICS)) {
            let topic = hit.matched_text.to_lowercase();
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        if !topics.is_empty() {
            reasons.push(format!("Questionable Majestic topics: {}.", topics.join(", ")));
        }

        if let Some(age) = record.get(DOMAIN_AGE).and_then(|v| v.as_f64()) {
            if age < self.settings.min_age_years {
                reasons.push(format!("Very new domain (Age: {} years).", age));
            }
        }

        if let Some(score) = record.get(SPAM_SCORE).and_then(|v| v.as_f64()) {
            if score > self.settings.max_spam_score {
                reasons.push(format!("High spam score (SZ: {}).", score));
            }
        }

        if let Some(variance) = metric_variance(record) {
            if variance > self.settings.max_metric_variance {
                reasons.push(format!("High variance between metrics ({}).", variance));
            }
        }

        reasons
    }
}

/// Max minus min of DA, AS and DR; unreadable values count as 0.
///
/// `None` unless the record carries all three columns.
pub fn metric_variance(record: &Record) -> Option<f64> {
    let values = AUTHORITY_METRICS
        .iter()
        .map(|column| record.get(column).map(|v| v.as_f64().unwrap_or(0.0)))
        .collect::<Option<Vec<f64>>>()?;
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    Some(max - min)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainScanReport {
    pub total_domains: usize,
    pub unsuitable_domains: usize,
    /// Every dictionary category in dictionary order, zero counts included
    pub category_counts: Vec<(String, usize)>,
    pub details: Vec<FlaggedDomain>,
    /// Domains with metric spam signals, in input order
    pub potential_spam: Vec<PotentialSpam>,
}

impl DomainScanReport {
    pub fn percentage_unsuitable(&self) -> f64 {
        if self.total_domains == 0 {
            0.0
        } else {
            self.unsuitable_domains as f64 / self.total_domains as f64 * 100.0
        }
    }

    pub fn flagged_names(&self) -> FxHashSet<String> {
        self.details.iter().map(|d| d.domain.clone()).collect()
    }

    /// Plain-text report dated `date`
    pub fn write_text<W: Write>(&self, mut out: W, date: NaiveDate) -> Result<()> {
        let date_str = date.format("%Y-%m-%d");
        writeln!(out, "Domain Analysis Report - {}", date_str)?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out)?;
        writeln!(out, "Total Domains Analyzed: {}", self.total_domains)?;
        writeln!(out, "Unsuitable Domains: {}", self.unsuitable_domains)?;
        writeln!(
            out,
            "Percentage Unsuitable: {:.2}%",
            self.percentage_unsuitable()
        )?;
        writeln!(out, "Potentially Spam Domains: {}", self.potential_spam.len())?;
        writeln!(out)?;
        writeln!(out, "Category Breakdown:")?;
        for (category, count) in &self.category_counts {
            writeln!(out, "{}: {} domains", category, count)?;
        }
        writeln!(out)?;
        writeln!(out, "Detailed Results (Unsuitable Domains):")?;
        writeln!(out, "{}", "-".repeat(50))?;
        for entry in &self.details {
            writeln!(out, "Domain: {}", entry.domain)?;
            writeln!(out, "  Matched Keywords: {}", entry.matched_keywords.join(", "))?;
            writeln!(
                out,
                "  Matched Categories: {}",
                entry.matched_categories.join(", ")
            )?;
            writeln!(out)?;
        }
        if !self.potential_spam.is_empty() {
            writeln!(out, "Potentially Spam:")?;
            writeln!(out, "{}", "-".repeat(50))?;
            for entry in &self.potential_spam {
                writeln!(out, "Domain: {}", entry.domain)?;
                writeln!(out, "  Reasons: {}", entry.reasons.join(" "))?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Write `<YYYY-MM-DD>_spamzilla_domain_data.txt` into `dir`
    pub fn save(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}_spamzilla_domain_data.txt",
            date.format("%Y-%m-%d")
        ));
        self.write_text(std::fs::File::create(&path)?, date)?;
        info!("Domain report saved to {}", path.display());
        Ok(path)
    }
}

fn domain_name(record: &Record) -> String {
    record.text(DOMAIN_NAME).trim().to_lowercase()
}

/// Scan the `Name` column of a domain export with default spam signal settings
pub fn scan_domains(table: &Table, dictionary: &KeywordDictionary) -> Result<DomainScanReport> {
    scan_domains_with(table, dictionary, &SpamChecker::default())
}

pub fn scan_domains_with(
    table: &Table,
    dictionary: &KeywordDictionary,
    spam: &SpamChecker,
) -> Result<DomainScanReport> {
    table.require_columns(&[DOMAIN_NAME])?;

    let matcher = Matcher::new(dictionary);
    let aggregation = aggregate(&table.records, &matcher, &[DOMAIN_NAME], DOMAIN_NAME);

    let details: Vec<FlaggedDomain> = aggregation
        .flagged_records()
        .map(|c| FlaggedDomain {
            domain: domain_name(&c.record),
            matched_keywords: c.flagged_terms.iter().map(|t| t.to_lowercase()).collect(),
            matched_categories: c.categories.iter().cloned().collect(),
        })
        .collect();

    let category_counts = dictionary
        .category_names()
        .into_iter()
        .map(|name| {
            let count = aggregation
                .summaries
                .get(name)
                .map(|s| s.record_count)
                .unwrap_or(0);
            (name.to_string(), count)
        })
        .collect();

    let potential_spam: Vec<PotentialSpam> = table
        .records
        .iter()
        .filter_map(|record| {
            let reasons = spam.reasons(record);
            (!reasons.is_empty()).then(|| PotentialSpam {
                domain: domain_name(record),
                reasons,
            })
        })
        .collect();

    debug!(
        "Flagged {} of {} domains, {} with spam signals",
        details.len(),
        aggregation.total_records,
        potential_spam.len()
    );

    Ok(DomainScanReport {
        total_domains: aggregation.total_records,
        unsuitable_domains: details.len(),
        category_counts,
        details,
        potential_spam,
    })
}

pub fn read_domain_export(path: &Path) -> Result<Table> {
    Table::read_csv(path, &ColumnAliases::spamzilla())
}

/// Most recently modified `*.csv` in `dir` that is not a cleaned copy
pub fn latest_export(dir: &Path) -> Result<PathBuf> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.csv");
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry.map_err(glob::GlobError::into_error)?;
        let cleaned = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(CLEANED_SUFFIX));
        if cleaned || !path.is_file() {
            continue;
        }
        let modified = std::fs::metadata(&path)?.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| LinkvetError::NoInputFiles(dir.to_path_buf()))
}

/// `<stem>_cleaned.csv` next to `path`
pub fn cleaned_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", stem, CLEANED_SUFFIX))
}

/// Copy of the export without flagged domains.
///
/// Rows are copied from the raw file, so kept rows keep their original field
/// text. The input file is left untouched.
pub fn write_cleaned_export(input: &Path, report: &DomainScanReport) -> Result<(PathBuf, usize)> {
    let flagged = report.flagged_names();

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(input)?;
    let headers = reader.headers()?.clone();
    let aliases = ColumnAliases::spamzilla();
    let name_index = headers
        .iter()
        .position(|h| aliases.canonical(h) == DOMAIN_NAME)
        .ok_or_else(|| LinkvetError::MissingColumn {
            column: DOMAIN_NAME.to_string(),
            path: input.to_path_buf(),
        })?;

    let path = cleaned_path(input);
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
    writer.write_record(&headers)?;

    let mut removed = 0;
    for row in reader.records() {
        let row = row?;
        let name = row.get(name_index).unwrap_or_default().trim().to_lowercase();
        if flagged.contains(&name) {
            removed += 1;
        } else {
            writer.write_record(&row)?;
        }
    }
    writer.flush()?;

    info!("Removed {} flagged domains, wrote {}", removed, path.display());
    Ok((path, removed))
}
