// Reports - flagged backlinks, category summaries and ratios as CSV, JSON or tables
use crate::analysis::BacklinkAnalysis;
use crate::columns::{ANCHOR, EXTERNAL_LINKS, REFERRING_DOMAIN, SOURCE_TITLE, SOURCE_URL};
use crate::error::Result;
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FLAGGED_HEADERS: [&str; 11] = [
    "Domain",
    "Flagged Word(s)",
    "Categories",
    "Amount",
    "Source URL",
    "Anchor",
    "Title",
    "Referring Domain",
    "External Links",
    "Location",
    "Row Number",
];

pub const SUMMARY_HEADERS: [&str; 4] = ["Domain", "Category", "Record Count", "Domain Count"];

pub const RATIO_HEADERS: [&str; 9] = [
    "Domain",
    "Total Backlinks",
    "Suspicious Backlinks",
    "Total Domains",
    "Suspicious Domains",
    "Backlink Ratio",
    "Domain Ratio",
    "Quality Backlinks",
    "Spammy Backlinks",
];

/// Flagged backlinks from pages with more outbound links than this are left
/// out of the flagged report
pub const DEFAULT_MAX_EXTERNAL_LINKS: f64 = 5000.0;

/// Paths of the three CSV files a backlink run writes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFiles {
    pub flagged: PathBuf,
    pub summary: PathBuf,
    pub ratios: PathBuf,
    #[serde(skip)]
    max_external_links: f64,
}

impl ReportFiles {
    /// `Backlink_Analysis_<YYYYMMDD>_{flagged,summary,ratios}.csv` under `dir`
    pub fn dated(dir: &Path, date: NaiveDate) -> Self {
        let stem = format!("Backlink_Analysis_{}", date.format("%Y%m%d"));
        Self {
            flagged: dir.join(format!("{}_flagged.csv", stem)),
            summary: dir.join(format!("{}_summary.csv", stem)),
            ratios: dir.join(format!("{}_ratios.csv", stem)),
            max_external_links: DEFAULT_MAX_EXTERNAL_LINKS,
        }
    }

    pub fn with_max_external_links(mut self, max_external_links: f64) -> Self {
        self.max_external_links = max_external_links;
        self
    }

    pub fn write_all(&self, analyses: &[BacklinkAnalysis]) -> Result<()> {
        if let Some(parent) = self.flagged.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_flagged_csv(
            std::fs::File::create(&self.flagged)?,
            analyses,
            self.max_external_links,
        )?;
        write_summary_csv(std::fs::File::create(&self.summary)?, analyses)?;
        write_ratios_csv(std::fs::File::create(&self.ratios)?, analyses)?;
        info!("Wrote reports to {}", self.flagged.display());
        Ok(())
    }
}

pub fn write_flagged_csv<W: Write>(
    writer: W,
    analyses: &[BacklinkAnalysis],
    max_external_links: f64,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(FLAGGED_HEADERS)?;

    for analysis in analyses {
        for flagged in analysis.dodgy_backlinks(max_external_links) {
            let classified = &flagged.classified;
            let record = &classified.record;
            let categories: Vec<&str> = classified.categories.iter().map(String::as_str).collect();
            csv_writer.write_record([
                analysis.domain.clone(),
                classified.flagged_terms.join(", "),
                categories.join(", "),
                classified.match_count.to_string(),
                record.text(SOURCE_URL),
                record.text(ANCHOR),
                record.text(SOURCE_TITLE),
                record.text(REFERRING_DOMAIN),
                record.text(EXTERNAL_LINKS),
                classified.locations.join(", "),
                flagged.row_number.to_string(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_summary_csv<W: Write>(writer: W, analyses: &[BacklinkAnalysis]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SUMMARY_HEADERS)?;

    for analysis in analyses {
        for summary in analysis.aggregation.summaries.values() {
            csv_writer.write_record([
                analysis.domain.clone(),
                summary.category.clone(),
                summary.record_count.to_string(),
                summary.domain_count.to_string(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_ratios_csv<W: Write>(writer: W, analyses: &[BacklinkAnalysis]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(RATIO_HEADERS)?;

    for analysis in analyses {
        let ratio = &analysis.ratio;
        csv_writer.write_record([
            analysis.domain.clone(),
            ratio.total_backlinks.to_string(),
            ratio.suspicious_backlinks.to_string(),
            ratio.total_domains.to_string(),
            ratio.suspicious_domains.to_string(),
            format!("{:.3}", ratio.backlink_ratio),
            format!("{:.3}", ratio.domain_ratio),
            analysis.quality.quality.to_string(),
            analysis.quality.spammy.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn ratios_table(analyses: &[BacklinkAnalysis]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Domain",
        "Backlinks",
        "Flagged",
        "Ref. Domains",
        "Flagged Domains",
        "Backlink %",
        "Domain %",
        "Quality",
        "Spammy",
    ]);

    for analysis in analyses {
        let ratio = &analysis.ratio;
        table.add_row(vec![
            analysis.domain.clone(),
            ratio.total_backlinks.to_string(),
            ratio.suspicious_backlinks.to_string(),
            ratio.total_domains.to_string(),
            ratio.suspicious_domains.to_string(),
            format!("{:.1}%", ratio.backlink_ratio * 100.0),
            format!("{:.1}%", ratio.domain_ratio * 100.0),
            analysis.quality.quality.to_string(),
            analysis.quality.spammy.to_string(),
        ]);
    }

    table
}

pub fn categories_table(analyses: &[BacklinkAnalysis]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Domain", "Category", "Backlinks", "Ref. Domains"]);

    for analysis in analyses {
        for summary in analysis.aggregation.summaries.values() {
            table.add_row(vec![
                analysis.domain.clone(),
                summary.category.clone(),
                summary.record_count.to_string(),
                summary.domain_count.to_string(),
            ]);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BacklinkAnalyzer;
    use crate::keywords::{KeywordDictionary, PatternKind};
    use crate::matcher::Matcher;
    use crate::record::Record;
    use tempfile::TempDir;

    fn sample_analysis() -> BacklinkAnalysis {
        let matcher = Matcher::new(&KeywordDictionary::from_lists(
            PatternKind::Literal,
            &[("Adult", &["porn"]), ("Gambling", &["casino"])],
        ));
        let records = vec![
            Record::new()
                .with("Source url", "https://a.com/x")
                .with("Anchor", "casino")
                .with("Source title", "Casino porn")
                .with("Referring Domain", "a.com")
                .with("External links", 340i64),
            Record::new()
                .with("Source url", "https://b.com/y")
                .with("Anchor", "garden")
                .with("Referring Domain", "b.com"),
        ];
        let headers = records[0].columns().map(String::from).collect();
        let table = crate::table::Table::from_records(headers, records);
        BacklinkAnalyzer::new(&matcher).analyze_table(&table, "target.com")
    }

    #[test]
    fn test_dated_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let files = ReportFiles::dated(Path::new("out"), date);
        assert_eq!(
            files.flagged,
            Path::new("out").join("Backlink_Analysis_20240307_flagged.csv")
        );
        assert_eq!(
            files.ratios,
            Path::new("out").join("Backlink_Analysis_20240307_ratios.csv")
        );
    }

    #[test]
    fn test_flagged_csv_columns() {
        let mut out = Vec::new();
        write_flagged_csv(&mut out, &[sample_analysis()], DEFAULT_MAX_EXTERNAL_LINKS).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Domain,Flagged Word(s),Categories,Amount,Source URL,Anchor,Title,Referring Domain,External Links,Location,Row Number"
        );
        assert_eq!(
            lines.next().unwrap(),
            "target.com,\"casino, Casino, porn\",\"Adult, Gambling\",3,https://a.com/x,casino,Casino porn,a.com,340,\"Anchor, Source title\",1"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_flagged_csv_honours_external_link_cap() {
        let mut out = Vec::new();
        write_flagged_csv(&mut out, &[sample_analysis()], 300.0).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_summary_and_ratio_csv() {
        let analysis = sample_analysis();

        let mut out = Vec::new();
        write_summary_csv(&mut out, std::slice::from_ref(&analysis)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Domain,Category,Record Count,Domain Count\ntarget.com,Adult,1,1\ntarget.com,Gambling,1,1\n"
        );

        let mut out = Vec::new();
        write_ratios_csv(&mut out, &[analysis]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "target.com,2,1,2,1,0.500,0.500,0,0"
        );
    }

    #[test]
    fn test_write_all_creates_files() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let files = ReportFiles::dated(&dir.path().join("reports"), date);
        files.write_all(&[sample_analysis()]).unwrap();

        let summary = std::fs::read_to_string(&files.summary).unwrap();
        assert!(summary.starts_with("Domain,Category"));
        assert!(files.flagged.exists());
        assert!(files.ratios.exists());
    }

    #[test]
    fn test_json_and_tables() {
        let analysis = sample_analysis();
        let json = to_json(std::slice::from_ref(&analysis)).unwrap();
        assert!(json.contains("\"suspicious_backlinks\": 1"));

        let rendered = ratios_table(std::slice::from_ref(&analysis)).to_string();
        assert!(rendered.contains("target.com"));
        assert!(rendered.contains("50.0%"));
        assert!(categories_table(&[analysis]).to_string().contains("Gambling"));
    }
}
