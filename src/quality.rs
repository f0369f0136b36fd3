// Backlink quality buckets - authority score / external link thresholds
use crate::columns::{EXTERNAL_LINKS, NOFOLLOW, PAGE_ASCORE, REFERRING_DOMAIN};
use crate::record::Record;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub min_authority_score: f64,
    pub max_external_links: f64,
    pub require_dofollow: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            min_authority_score: 5.0,
            max_external_links: 200.0,
            require_dofollow: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpammySettings {
    pub max_authority_score: f64,
    pub min_external_links: f64,
}

impl Default for SpammySettings {
    fn default() -> Self {
        Self {
            max_authority_score: 5.0,
            min_external_links: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacklinkQuality {
    Quality,
    Spammy,
    Neutral,
    /// Authority score or external link count missing
    Unscored,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub quality: usize,
    pub spammy: usize,
    pub neutral: usize,
    pub unscored: usize,
    /// Distinct referring domains with at least one quality backlink
    pub quality_domains: usize,
}

#[derive(Debug, Clone, Default)]
pub struct QualityFilter {
    pub quality: QualitySettings,
    pub spammy: SpammySettings,
}

impl QualityFilter {
    pub fn new(quality: QualitySettings, spammy: SpammySettings) -> Self {
        Self { quality, spammy }
    }

    /// Bucket one backlink. Quality is checked before spammy.
    pub fn bucket(&self, record: &Record) -> BacklinkQuality {
        let ascore = record.get(PAGE_ASCORE).and_then(|v| v.as_f64());
        let external = record.get(EXTERNAL_LINKS).and_then(|v| v.as_f64());
        let (Some(ascore), Some(external)) = (ascore, external) else {
            return BacklinkQuality::Unscored;
        };
        let nofollow = record
            .get(NOFOLLOW)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if ascore >= self.quality.min_authority_score
            && external <= self.quality.max_external_links
            && !(self.quality.require_dofollow && nofollow)
        {
            BacklinkQuality::Quality
        } else if ascore <= self.spammy.max_authority_score
            && external >= self.spammy.min_external_links
        {
            BacklinkQuality::Spammy
        } else {
            BacklinkQuality::Neutral
        }
    }

    pub fn breakdown(&self, records: &[Record]) -> QualityBreakdown {
        let mut result = QualityBreakdown::default();
        let mut domains = FxHashSet::default();

        for record in records {
            match self.bucket(record) {
                BacklinkQuality::Quality => {
                    result.quality += 1;
                    let domain = record.text(REFERRING_DOMAIN);
                    if !domain.is_empty() {
                        domains.insert(domain);
                    }
                }
                BacklinkQuality::Spammy => result.spammy += 1,
                BacklinkQuality::Neutral => result.neutral += 1,
                BacklinkQuality::Unscored => result.unscored += 1,
            }
        }

        result.quality_domains = domains.len();
        result
    }
}
