//! Crisis detector: stateless scan for risk language
//!
//! A safety net, not a classifier. The pattern list is data (see
//! `CrisisConfig`) so it can be audited and extended without a rebuild.
//! Runs on the raw chunk, never on the recency window.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::core::lexicon::folds;
use crate::error::ConfigError;
use crate::types::{CrisisCategory, CrisisPattern, CrisisResult};

/// Built-in risk-language list (Turkish first, then English)
pub fn default_patterns() -> Vec<CrisisPattern> {
    use CrisisCategory::*;
    [
        (SelfHarm, r"\bkendimi öldür\w*"),
        (SelfHarm, r"\bintihar\w*"),
        (SelfHarm, r"\bcanıma kıy\w*"),
        (SelfHarm, r"\bkendime zarar\w*"),
        (SelfHarm, r"\bbilek\w* kes\w*"),
        (SelfHarm, r"\bölmek istiyorum\b"),
        (SelfHarm, r"\byaşamak istemiyorum\b"),
        (SelfHarm, r"\bhayatıma son ver\w*"),
        (SelfHarm, r"\b(?:kill myself|hurt myself|want to die|end my life)\b"),
        (SelfHarm, r"\bsuicid\w*"),
        (Hopelessness, r"\bumudum kalmadı\b"),
        (Hopelessness, r"\bhiç umut yok\b"),
        (Hopelessness, r"\byaşamanın (?:bir )?anlamı yok\b"),
        (Hopelessness, r"\bher şey anlamsız\b"),
        (Hopelessness, r"\bherkes bensiz daha iyi\w*"),
        (Hopelessness, r"\bkimse beni özlemez\b"),
        (Hopelessness, r"\b(?:no reason to live|better off without me|hopeless)\b"),
        (Plan, r"\bhap\w* (?:içece\w*|yutaca\w*)"),
        (Plan, r"\bköprüden atla\w*"),
        (Plan, r"\bkendimi asaca\w*"),
        (Plan, r"\bveda mektub\w*"),
        (Plan, r"\b(?:suicide note|goodbye letter)\b"),
        (Violence, r"\bseni öldürece\w*"),
        (Violence, r"\böldüreceğim\b"),
        (Violence, r"\böldürmek istiyorum\b"),
        (Violence, r"\b(?:i will kill you|i'm going to kill)\b"),
    ]
    .into_iter()
    .map(|(category, pattern)| CrisisPattern::new(category, pattern))
    .collect()
}

lazy_static! {
    static ref DEFAULT_DETECTOR: CrisisDetector = CrisisDetector::from_patterns(&default_patterns())
        .expect("built-in crisis patterns compile");
}

/// Compiled risk-language list
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    patterns: Vec<(CrisisCategory, Regex)>,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        DEFAULT_DETECTOR.clone()
    }
}

impl CrisisDetector {
    /// Compile a pattern list; any invalid regex rejects the whole list
    pub fn from_patterns(patterns: &[CrisisPattern]) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|re| (p.category, re))
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: p.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns: compiled })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Scan text. Same text, same result, every time.
    ///
    /// Both lowercase folds are scanned so Turkish capitals and capitalised
    /// English (`I will ...`) each match their own patterns.
    pub fn detect(&self, text: &str) -> CrisisResult {
        let folded = folds(text);
        if folded[0].trim().is_empty() {
            return CrisisResult::clear();
        }

        let mut hits: Vec<String> = Vec::new();
        let mut categories: Vec<CrisisCategory> = Vec::new();
        for normalized in &folded {
            self.scan_fold(normalized, &mut hits, &mut categories);
        }

        let flagged = !hits.is_empty();
        if flagged {
            warn!("crisis language detected: {} hit(s), categories {:?}", hits.len(), categories);
        }
        CrisisResult {
            flagged,
            hits,
            categories,
        }
    }

    fn scan_fold(&self, normalized: &str, hits: &mut Vec<String>, categories: &mut Vec<CrisisCategory>) {
        let mut matches: Vec<(usize, usize, CrisisCategory)> = self
            .patterns
            .iter()
            .flat_map(|(category, re)| {
                re.find_iter(normalized).map(move |m| (m.start(), m.end(), *category))
            })
            .collect();
        // Earliest first; longest first at the same start
        matches.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut covered_until = 0;
        for (start, end, category) in matches {
            if end <= covered_until {
                continue;
            }
            covered_until = end;
            let phrase = normalized[start..end].to_string();
            if !hits.contains(&phrase) {
                hits.push(phrase);
            }
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }
}

/// Scan with the built-in list
pub fn detect_crisis(text: &str) -> CrisisResult {
    DEFAULT_DETECTOR.detect(text)
}

// =============================================================================
// TESTS
// =============================================================================
