// Backlink analysis - one export through classification, ratios and quality buckets
use crate::aggregator::{
    aggregate, distinct_group_values, group_value, Aggregation, FlaggedRecord, UNKNOWN_GROUP,
};
use crate::columns::{ColumnAliases, DEFAULT_SCAN_COLUMNS, EXTERNAL_LINKS, REFERRING_DOMAIN};
use crate::error::{LinkvetError, Result};
use crate::matcher::Matcher;
use crate::quality::{QualityBreakdown, QualityFilter};
use crate::record::Record;
use crate::table::{domain_from_file_name, Table};
use fxhash::FxHashSet;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Share of flagged backlinks and referring domains in one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousRatio {
    pub total_backlinks: usize,
    pub suspicious_backlinks: usize,
    pub total_domains: usize,
    pub suspicious_domains: usize,
    pub backlink_ratio: f64,
    pub domain_ratio: f64,
}

impl SuspiciousRatio {
    /// Domains are distinct [`group_value`]s, the same grouping the category
    /// summaries use
    pub fn compute(records: &[Record], aggregation: &Aggregation, group_key: &str) -> Self {
        let total_domains = distinct_group_values(records, group_key);
        let suspicious_domains = aggregation
            .flagged_records()
            .map(|c| group_value(&c.record, group_key))
            .collect::<FxHashSet<_>>()
            .len();

        let total_backlinks = records.len();
        let suspicious_backlinks = aggregation.flagged.len();

        Self {
            total_backlinks,
            suspicious_backlinks,
            total_domains,
            suspicious_domains,
            backlink_ratio: ratio(suspicious_backlinks, total_backlinks),
            domain_ratio: ratio(suspicious_domains, total_domains),
        }
    }
}

/// `part / whole` rounded to 3 decimals, denominator floored at 1
pub fn ratio(part: usize, whole: usize) -> f64 {
    let value = part as f64 / whole.max(1) as f64;
    (value * 1000.0).round() / 1000.0
}

/// Everything computed for one backlink export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkAnalysis {
    pub source: Option<PathBuf>,
    /// Target domain the export was pulled for
    pub domain: String,
    pub aggregation: Aggregation,
    pub ratio: SuspiciousRatio,
    pub quality: QualityBreakdown,
}

impl BacklinkAnalysis {
    /// Flagged backlinks kept for the dodgy-backlink report.
    ///
    /// Backlinks from pages with more than `max_external_links` outbound links
    /// are left out; rows without a readable count are kept.
    pub fn dodgy_backlinks(&self, max_external_links: f64) -> impl Iterator<Item = &FlaggedRecord> {
        self.aggregation.flagged.iter().filter(move |f| {
            f.classified
                .record
                .get(EXTERNAL_LINKS)
                .and_then(|v| v.as_f64())
                .map_or(true, |links| links <= max_external_links)
        })
    }
}

/// Analyses of a multi-file run, in input path order, plus the files that failed
#[derive(Debug, Default)]
pub struct AnalysisRun {
    pub analyses: Vec<BacklinkAnalysis>,
    pub failures: Vec<(PathBuf, LinkvetError)>,
}

pub struct BacklinkAnalyzer<'a> {
    matcher: &'a Matcher,
    columns_to_scan: Vec<String>,
    group_key: String,
    quality: QualityFilter,
    aliases: ColumnAliases,
    show_progress: bool,
}

impl<'a> BacklinkAnalyzer<'a> {
    pub fn new(matcher: &'a Matcher) -> Self {
        Self {
            matcher,
            columns_to_scan: DEFAULT_SCAN_COLUMNS.iter().map(|c| c.to_string()).collect(),
            group_key: REFERRING_DOMAIN.to_string(),
            quality: QualityFilter::default(),
            aliases: ColumnAliases::semrush(),
            show_progress: false,
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns_to_scan = columns;
        self
    }

    pub fn with_group_key(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = group_key.into();
        self
    }

    pub fn with_quality_filter(mut self, quality: QualityFilter) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn analyze_table(&self, table: &Table, domain: &str) -> BacklinkAnalysis {
        let columns: Vec<&str> = self.columns_to_scan.iter().map(String::as_str).collect();
        let aggregation = aggregate(&table.records, self.matcher, &columns, &self.group_key);
        let ratio = SuspiciousRatio::compute(&table.records, &aggregation, &self.group_key);
        let quality = self.quality.breakdown(&table.records);

        BacklinkAnalysis {
            source: table.source.clone(),
            domain: domain.to_string(),
            aggregation,
            ratio,
            quality,
        }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<BacklinkAnalysis> {
        let mut table = Table::read_csv(path, &self.aliases)?;
        table.add_referring_domain_column();
        let domain = domain_from_file_name(path).unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        let analysis = self.analyze_table(&table, &domain);
        debug!(
            "{}: {} of {} backlinks flagged",
            domain, analysis.ratio.suspicious_backlinks, analysis.ratio.total_backlinks
        );
        Ok(analysis)
    }

    /// Analyze files in parallel; a failing file is logged and skipped
    pub fn analyze_files(&self, paths: &[PathBuf]) -> AnalysisRun {
        info!("Analyzing {} export files", paths.len());

        let pb = if self.show_progress {
            let pb = ProgressBar::new(paths.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed}] {bar:40.cyan/blue} {pos}/{len} files {msg}")
            {
                pb.set_style(style.progress_chars("=>-"));
            }
            Some(pb)
        } else {
            None
        };

        let results: Vec<(PathBuf, Result<BacklinkAnalysis>)> = paths
            .par_iter()
            .map(|path| {
                let result = self.analyze_file(path);
                if let Some(ref pb) = pb {
                    pb.inc(1);
                }
                (path.clone(), result)
            })
            .collect();

        if let Some(pb) = pb {
            pb.finish_with_message("Done!");
        }

        let mut run = AnalysisRun::default();
        for (path, result) in results {
            match result {
                Ok(analysis) => run.analyses.push(analysis),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    run.failures.push((path, e));
                }
            }
        }
        run.analyses.sort_by(|a, b| a.source.cmp(&b.source));
        run
    }
}
