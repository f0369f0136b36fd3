// Configuration management module
// Scan columns, thresholds and dictionary locations persisted as JSON

use crate::columns::{DEFAULT_SCAN_COLUMNS, REFERRING_DOMAIN};
use crate::domains::{SpamChecker, SpamSignalSettings};
use crate::error::Result;
use crate::keywords::{content_keywords, domain_keywords, KeywordDictionary};
use crate::quality::{QualityFilter, QualitySettings, SpammySettings};
use crate::report::DEFAULT_MAX_EXTERNAL_LINKS;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub columns_to_scan: Vec<String>,
    pub group_key: String,
    pub file_patterns: Vec<String>,
    pub recursive: bool,
    pub quality: QualitySettings,
    pub spammy: SpammySettings,
    /// Flagged backlinks above this many external links stay out of the flagged report
    pub max_flagged_external_links: f64,
    pub domain_spam: SpamSignalSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_keywords: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_keywords: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            columns_to_scan: DEFAULT_SCAN_COLUMNS.iter().map(|c| c.to_string()).collect(),
            group_key: REFERRING_DOMAIN.to_string(),
            file_patterns: vec!["*-backlinks.csv".to_string()],
            recursive: false,
            quality: QualitySettings::default(),
            spammy: SpammySettings::default(),
            max_flagged_external_links: DEFAULT_MAX_EXTERNAL_LINKS,
            domain_spam: SpamSignalSettings::default(),
            content_keywords: None,
            domain_keywords: None,
            output_dir: PathBuf::from("linkvet-output"),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path())
    }

    /// Default location, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self> {
        let path = Self::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkvet")
            .join("config.json")
    }

    pub fn quality_filter(&self) -> QualityFilter {
        QualityFilter::new(self.quality.clone(), self.spammy.clone())
    }

    pub fn spam_checker(&self) -> SpamChecker {
        SpamChecker::new(self.domain_spam.clone())
    }

    /// Content dictionary: `override_path`, then the configured file, then built-ins
    pub fn content_dictionary(
        &self,
        override_path: Option<&Path>,
    ) -> Result<Cow<'static, KeywordDictionary>> {
        resolve(override_path, self.content_keywords.as_deref(), content_keywords())
    }

    pub fn domain_dictionary(
        &self,
        override_path: Option<&Path>,
    ) -> Result<Cow<'static, KeywordDictionary>> {
        resolve(override_path, self.domain_keywords.as_deref(), domain_keywords())
    }
}

fn resolve(
    override_path: Option<&Path>,
    configured: Option<&Path>,
    builtin: &'static KeywordDictionary,
) -> Result<Cow<'static, KeywordDictionary>> {
    match override_path.or(configured) {
        Some(path) => {
            debug!("Loading keyword dictionary from {}", path.display());
            Ok(Cow::Owned(KeywordDictionary::load(path)?))
        }
        None => Ok(Cow::Borrowed(builtin)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(
            config.columns_to_scan,
            vec!["Anchor", "Source title", "Source url", "Referring Domain"]
        );
        assert_eq!(config.group_key, "Referring Domain");
        assert_eq!(config.quality.min_authority_score, 5.0);
        assert_eq!(config.spammy.min_external_links, 200.0);
        assert_eq!(config.max_flagged_external_links, 5000.0);
        assert_eq!(config.domain_spam.max_spam_score, 20.0);
        assert!(AppConfig::config_file_path().ends_with("linkvet/config.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.recursive = true;
        config.domain_keywords = Some(PathBuf::from("/tmp/domains.json"));
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"group_key": "Target url", "domain_spam": {"max_spam_score": 30.0, "min_age_years": 1.0, "max_metric_variance": 40.0}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.group_key, "Target url");
        assert_eq!(config.domain_spam.max_spam_score, 30.0);
        assert_eq!(config.max_flagged_external_links, 5000.0);
        assert_eq!(config.file_patterns, vec!["*-backlinks.csv"]);
    }

    #[test]
    fn test_dictionary_resolution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.json");
        fs::write(
            &path,
            r#"{"categories": [{"name": "Crypto", "patterns": ["bitcoin"]}]}"#,
        )
        .unwrap();

        let config = AppConfig::default();
        let builtin = config.content_dictionary(None).unwrap();
        assert!(matches!(builtin, Cow::Borrowed(_)));

        let custom = config.content_dictionary(Some(&path)).unwrap();
        assert_eq!(custom.category_names(), vec!["Crypto"]);

        let configured = AppConfig {
            domain_keywords: Some(path.clone()),
            ..AppConfig::default()
        };
        assert_eq!(
            configured.domain_dictionary(None).unwrap().category_names(),
            vec!["Crypto"]
        );
    }

    #[test]
    fn test_missing_dictionary_file_is_error() {
        let config = AppConfig::default();
        assert!(config
            .content_dictionary(Some(Path::new("/nonexistent/words.json")))
            .is_err());
    }
}
