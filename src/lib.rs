//! Keyword-category screening of SEO exports.
//!
//! Backlink exports are scanned for dodgy anchors, titles and URLs; expired
//! domain exports are scanned for dodgy domain names.

pub mod aggregator;
pub mod analysis;
pub mod classifier;
pub mod cli_output;
pub mod columns;
pub mod config;
pub mod domains;
pub mod error;
pub mod keywords;
pub mod matcher;
pub mod quality;
pub mod record;
pub mod report;
pub mod table;

pub use aggregator::{aggregate, Aggregation, CategorySummary, FlaggedRecord};
pub use analysis::{BacklinkAnalysis, BacklinkAnalyzer, SuspiciousRatio};
pub use classifier::{classify, ClassifiedRecord};
pub use config::AppConfig;
pub use error::{LinkvetError, Result};
pub use keywords::{
    content_keywords, domain_keywords, topic_keywords, KeywordDictionary, Pattern, PatternKind,
};
pub use matcher::{MatchResult, Matcher};
pub use record::{CellValue, Record};
pub use table::Table;
