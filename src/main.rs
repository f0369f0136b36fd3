use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use linkvet::analysis::BacklinkAnalyzer;
use linkvet::cli_output::{format_percent, format_size, OutputMode, OutputWriter};
use linkvet::config::AppConfig;
use linkvet::domains::{latest_export, read_domain_export, scan_domains_with, write_cleaned_export};
use linkvet::matcher::{highlight, HighlightStyle, Matcher};
use linkvet::report::{self, ReportFiles};
use linkvet::table::discover_files;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "linkvet")]
#[command(about = "Flag spammy, adult and gambling backlinks and domain names in SEO exports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (human, plain, json); detected from the terminal by default
    #[arg(short, long, global = true)]
    format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan SEMRUSH backlink exports for dodgy anchors, titles and URLs
    Backlinks {
        /// Export file, or directory of exports
        path: PathBuf,

        /// File name glob for exports in a directory (repeatable)
        #[arg(short, long)]
        pattern: Vec<String>,

        /// Search subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Keyword dictionary JSON file (default: built-in content keywords)
        #[arg(short, long)]
        keywords: Option<PathBuf>,

        /// Comma-separated columns to scan
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Column that identifies a referring domain
        #[arg(long)]
        group_key: Option<String>,

        /// Directory for the CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print results without writing CSV reports
        #[arg(long)]
        no_write: bool,
    },

    /// Scan a Spamzilla domain export for dodgy domain names
    Domains {
        /// Export file, or directory holding exports (latest one is used)
        path: PathBuf,

        /// Keyword dictionary JSON file (default: built-in domain keywords)
        #[arg(short, long)]
        keywords: Option<PathBuf>,

        /// Directory for the text report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write `<name>_cleaned.csv` without the flagged domains
        #[arg(long)]
        clean: bool,
    },

    /// Check a piece of text against a keyword dictionary
    Check {
        text: String,

        /// Use the domain-name dictionary instead of the content one
        #[arg(long)]
        domain: bool,

        /// Keyword dictionary JSON file
        #[arg(short, long)]
        keywords: Option<PathBuf>,
    },

    /// List keyword categories and patterns
    Keywords {
        /// Show the patterns of one category
        #[arg(short, long)]
        category: Option<String>,

        /// Use the domain-name dictionary instead of the content one
        #[arg(long)]
        domain: bool,

        /// Write the dictionary as JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let out = match cli.format.as_deref() {
        Some(name) => OutputWriter::new(
            OutputMode::from_name(name)
                .with_context(|| format!("Unknown output format: {}", name))?,
        ),
        None => OutputWriter::auto(),
    };

    match cli.command {
        Commands::Backlinks {
            path,
            pattern,
            recursive,
            keywords,
            columns,
            group_key,
            output,
            no_write,
        } => {
            info!("Scanning backlink exports in {}", path.display());
            let config = AppConfig::load_or_default().context("Failed to load configuration")?;

            let patterns = if pattern.is_empty() {
                config.file_patterns.clone()
            } else {
                pattern
            };
            let files = discover_files(&path, &patterns, recursive || config.recursive)
                .with_context(|| format!("No exports to analyze at {}", path.display()))?;
            for file in &files {
                let size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
                debug!("Input: {} ({})", file.display(), format_size(size));
            }

            let dictionary = config
                .content_dictionary(keywords.as_deref())
                .context("Failed to load keyword dictionary")?;
            let matcher = Matcher::new(&dictionary);
            for rejected in matcher.rejected() {
                out.warning(&format!(
                    "Skipped invalid pattern '{}' ({}): {}",
                    rejected.pattern, rejected.category, rejected.reason
                ));
            }

            let analyzer = BacklinkAnalyzer::new(&matcher)
                .with_columns(columns.unwrap_or_else(|| config.columns_to_scan.clone()))
                .with_group_key(group_key.unwrap_or_else(|| config.group_key.clone()))
                .with_quality_filter(config.quality_filter())
                .with_progress(out.is_human() && files.len() > 1);
            let run = analyzer.analyze_files(&files);

            for (file, e) in &run.failures {
                out.error(&format!("Skipped {}: {}", file.display(), e));
            }
            if run.analyses.is_empty() {
                bail!("None of the {} export files could be processed", files.len());
            }

            let written = if no_write {
                None
            } else {
                let dir = output.unwrap_or_else(|| config.output_dir.clone());
                let report_files = ReportFiles::dated(&dir, chrono::Local::now().date_naive())
                    .with_max_external_links(config.max_flagged_external_links);
                report_files
                    .write_all(&run.analyses)
                    .with_context(|| format!("Failed to write reports to {}", dir.display()))?;
                Some(report_files)
            };

            if out.is_json() {
                out.json(&report::to_json(&run.analyses)?);
                return Ok(());
            }

            out.section("Suspicious Backlinks");
            out.render(&report::ratios_table(&run.analyses));
            if run.analyses.iter().any(|a| !a.aggregation.is_empty()) {
                out.section("Categories");
                out.render(&report::categories_table(&run.analyses));
            }

            let total: usize = run.analyses.iter().map(|a| a.ratio.total_backlinks).sum();
            let flagged: usize = run.analyses.iter().map(|a| a.ratio.suspicious_backlinks).sum();
            out.section("Summary");
            out.metric("Exports analyzed", &run.analyses.len().to_string());
            out.metric("Backlinks", &total.to_string());
            out.metric(
                "Flagged",
                &format!(
                    "{} ({})",
                    flagged,
                    format_percent(linkvet::analysis::ratio(flagged, total))
                ),
            );

            if let Some(files) = written {
                out.success(&format!("Flagged backlinks: {}", files.flagged.display()));
                out.success(&format!("Category summary: {}", files.summary.display()));
                out.success(&format!("Ratios: {}", files.ratios.display()));
            }

            Ok(())
        }

        Commands::Domains {
            path,
            keywords,
            output,
            clean,
        } => {
            let config = AppConfig::load_or_default().context("Failed to load configuration")?;
            let input = if path.is_dir() {
                latest_export(&path)
                    .with_context(|| format!("No domain exports in {}", path.display()))?
            } else {
                path
            };
            info!("Analyzing domain export {}", input.display());

            let table = read_domain_export(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let dictionary = config
                .domain_dictionary(keywords.as_deref())
                .context("Failed to load keyword dictionary")?;
            let scan = scan_domains_with(&table, &dictionary, &config.spam_checker())
                .with_context(|| format!("Failed to scan {}", input.display()))?;

            let dir = output.unwrap_or_else(|| config.output_dir.clone());
            let report_path = scan.save(&dir, chrono::Local::now().date_naive())?;
            let cleaned = if clean {
                Some(write_cleaned_export(&input, &scan)?)
            } else {
                None
            };

            if out.is_json() {
                out.json(&report::to_json(&scan)?);
                return Ok(());
            }

            out.section("Domain Analysis");
            out.table(&[
                ("Domains analyzed", scan.total_domains.to_string()),
                ("Unsuitable", scan.unsuitable_domains.to_string()),
                (
                    "Percentage unsuitable",
                    format!("{:.2}%", scan.percentage_unsuitable()),
                ),
                ("Potentially spam", scan.potential_spam.len().to_string()),
            ]);
            out.section("Category Breakdown");
            for (category, count) in &scan.category_counts {
                out.metric(category, &format!("{} domains", count));
            }
            if cli.verbose {
                out.section("Flagged Domains");
                for entry in &scan.details {
                    out.info(&format!(
                        "{} [{}]",
                        entry.domain,
                        entry.matched_keywords.join(", ")
                    ));
                }
                if !scan.potential_spam.is_empty() {
                    out.section("Potentially Spam");
                    for entry in &scan.potential_spam {
                        out.info(&format!("{}: {}", entry.domain, entry.reasons.join(" ")));
                    }
                }
            }

            out.success(&format!("Report saved to {}", report_path.display()));
            if let Some((path, removed)) = cleaned {
                out.success(&format!(
                    "Removed {} flagged domains, cleaned copy at {}",
                    removed,
                    path.display()
                ));
            }

            Ok(())
        }

        Commands::Check {
            text,
            domain,
            keywords,
        } => {
            let config = AppConfig::load_or_default().context("Failed to load configuration")?;
            let dictionary = if domain {
                config.domain_dictionary(keywords.as_deref())?
            } else {
                config.content_dictionary(keywords.as_deref())?
            };
            let matcher = Matcher::new(&dictionary);
            let matches = matcher.find_matches(&text);

            if out.is_json() {
                out.json(&report::to_json(&matches)?);
                return Ok(());
            }

            if matches.is_empty() {
                out.success("No keywords found");
                return Ok(());
            }

            let style = if out.is_human() {
                HighlightStyle::Terminal
            } else {
                HighlightStyle::Mark
            };
            out.warning(&format!("{} keyword hits", matches.len()));
            out.info(&highlight(&text, &matches, style));
            for m in &matches {
                out.metric(&m.category, &format!("'{}' at {}", m.matched_text, m.position));
            }

            Ok(())
        }

        Commands::Keywords {
            category,
            domain,
            export,
        } => {
            let config = AppConfig::load_or_default().context("Failed to load configuration")?;
            let dictionary = if domain {
                config.domain_dictionary(None)?
            } else {
                config.content_dictionary(None)?
            };

            if let Some(path) = export {
                fs::write(&path, dictionary.to_json()?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                out.success(&format!("Dictionary written to {}", path.display()));
                return Ok(());
            }

            if let Some(name) = category {
                let patterns = dictionary.patterns_for(&name);
                if patterns.is_empty() {
                    bail!(
                        "Unknown category '{}'. Available: {}",
                        name,
                        dictionary.category_names().join(", ")
                    );
                }
                if out.is_json() {
                    out.json(&report::to_json(patterns)?);
                    return Ok(());
                }
                out.section(&name);
                for pattern in patterns {
                    out.info(&format!("[{}] {}", pattern.kind.name(), pattern.text));
                }
                return Ok(());
            }

            if out.is_json() {
                out.json(&dictionary.to_json()?);
                return Ok(());
            }
            out.section("Keyword Categories");
            for entry in dictionary.categories() {
                out.metric(&entry.name, &format!("{} patterns", entry.patterns.len()));
            }

            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = AppConfig::load_or_default().context("Failed to load configuration")?;
                out.json(&serde_json::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Init { force } => {
                let path = AppConfig::config_file_path();
                if path.exists() && !force {
                    bail!(
                        "Config already exists at {} (use --force to overwrite)",
                        path.display()
                    );
                }
                let path = AppConfig::default().save()?;
                out.success(&format!("Wrote default config to {}", path.display()));
                Ok(())
            }
            ConfigAction::Path => {
                println!("{}", AppConfig::config_file_path().display());
                Ok(())
            }
        },
    }
}
