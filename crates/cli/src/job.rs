//! Job files: one reconciliation described in TOML.
//!
//! ```toml
//! source = "Change the user ID generation method ..."
//! old_destination = "..."
//! new_destination = "..."
//! metric = "char"
//!
//! [oracle]
//! kind = "glossary"
//! terms = [{ source = "v4", destination = "v4" }]
//!
//! [[candidates]]
//! text = "..."
//!
//! [engine]
//! concurrency = 2
//! ```

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Deserialize;

use mindrift_reconcile::config::{EngineConfig, PromptConfig};
use mindrift_reconcile::text::{GlossaryEntry, GlossaryOracle, NormalizedEditDistance, WordEditDistance};
use mindrift_reconcile::{CapabilityError, ConsistencyOracle, DiffMetric, Element, FixedCandidates, ReconcileError};

#[derive(Debug, Deserialize)]
pub struct Job {
    pub source: String,
    pub old_destination: String,
    pub new_destination: String,
    #[serde(default)]
    pub source_domain: Option<String>,
    #[serde(default)]
    pub destination_domain: Option<String>,
    #[serde(default)]
    pub metric: MetricKind,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Normalized character edit distance
    #[default]
    Char,
    /// Normalized word edit distance
    Word,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Char => "char",
            MetricKind::Word => "word",
        }
    }

    pub fn between(&self, a: &str, b: &str) -> f64 {
        match self {
            MetricKind::Char => NormalizedEditDistance::between(a, b),
            MetricKind::Word => WordEditDistance::between(a, b),
        }
    }
}

impl DiffMetric<Element> for MetricKind {
    fn distance(&self, candidate: &Element, previous: &Element) -> Result<f64, CapabilityError> {
        Ok(self.between(&candidate.payload, &previous.payload))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// Term correspondence between the two sides.
    Glossary,
    /// Verdicts recorded per candidate by a reviewer.
    Review,
}

#[derive(Debug, Deserialize)]
pub struct OracleConfig {
    pub kind: OracleKind,
    #[serde(default)]
    pub terms: Vec<GlossaryEntry>,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateEntry {
    pub text: String,
    /// Reviewer verdict; required when `oracle.kind = "review"`.
    #[serde(default)]
    pub consistent: Option<bool>,
}

/// Oracle built from a job's `[oracle]` table.
#[derive(Debug)]
pub enum JobOracle {
    Glossary(GlossaryOracle),
    Review(HashMap<String, bool>),
}

impl ConsistencyOracle<Element, Element> for JobOracle {
    fn is_consistent(&self, source: &Element, destination: &Element) -> Result<bool, CapabilityError> {
        match self {
            JobOracle::Glossary(glossary) => glossary.is_consistent(source, destination),
            JobOracle::Review(verdicts) => verdicts.get(&source.payload).copied().ok_or_else(|| {
                CapabilityError::new(format!("no review verdict for candidate \"{}\"", source.payload))
            }),
        }
    }
}

impl Job {
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let job: Job = toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.engine.validate()?;
        self.prompt.build()?;

        match self.oracle.kind {
            OracleKind::Glossary => {
                if self.oracle.terms.is_empty() {
                    return Err(ReconcileError::ConfigValidation(
                        "glossary oracle needs at least one entry in oracle.terms".into(),
                    ));
                }
                if let Some(entry) = self
                    .oracle
                    .terms
                    .iter()
                    .find(|t| t.source.is_empty() || t.destination.is_empty())
                {
                    return Err(ReconcileError::ConfigValidation(format!(
                        "glossary entry has an empty side: {:?} / {:?}",
                        entry.source, entry.destination
                    )));
                }
            }
            OracleKind::Review => {
                if let Some(pos) = self.candidates.iter().position(|c| c.consistent.is_none()) {
                    return Err(ReconcileError::ConfigValidation(format!(
                        "candidate {pos} has no `consistent` verdict (required by the review oracle)"
                    )));
                }
                check_conflicting_verdicts(&self.candidates)?;
            }
        }

        Ok(())
    }

    pub fn source_element(&self) -> Element {
        element(&self.source, &self.source_domain)
    }

    pub fn old_destination_element(&self) -> Element {
        element(&self.old_destination, &self.destination_domain)
    }

    pub fn new_destination_element(&self) -> Element {
        element(&self.new_destination, &self.destination_domain)
    }

    pub fn generator(&self) -> FixedCandidates<Element> {
        self.candidates
            .iter()
            .map(|c| element(&c.text, &self.source_domain))
            .collect()
    }

    pub fn build_oracle(&self) -> JobOracle {
        match self.oracle.kind {
            OracleKind::Glossary => {
                let glossary = GlossaryOracle::new(self.oracle.terms.clone());
                JobOracle::Glossary(if self.oracle.case_sensitive {
                    glossary
                } else {
                    glossary.case_insensitive()
                })
            }
            OracleKind::Review => JobOracle::Review(
                self.candidates
                    .iter()
                    .filter_map(|c| c.consistent.map(|v| (c.text.clone(), v)))
                    .collect(),
            ),
        }
    }

    pub fn oracle_description(&self) -> String {
        match self.oracle.kind {
            OracleKind::Glossary => format!("glossary ({} terms)", self.oracle.terms.len()),
            OracleKind::Review => "review".to_string(),
        }
    }
}

/// Verdicts are looked up by candidate text, so the same text must not be
/// judged both ways.
fn check_conflicting_verdicts(candidates: &[CandidateEntry]) -> Result<(), ReconcileError> {
    let mut seen: HashMap<&str, (usize, Option<bool>)> = HashMap::new();
    for (pos, candidate) in candidates.iter().enumerate() {
        match seen.get(candidate.text.as_str()) {
            Some(&(first, verdict)) if verdict != candidate.consistent => {
                return Err(ReconcileError::ConfigValidation(format!(
                    "candidates {first} and {pos} have the same text but conflicting verdicts"
                )));
            }
            Some(_) => {}
            None => {
                seen.insert(&candidate.text, (pos, candidate.consistent));
            }
        }
    }
    Ok(())
}

fn element(payload: &str, domain: &Option<String>) -> Element {
    match domain {
        Some(domain) => Element::tagged(payload, domain.as_str()),
        None => Element::new(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOSSARY_JOB: &str = r#"
source = "use UUID"
old_destination = "UUID を使う"
new_destination = "UUID v4 を使う"
source_domain = "en"
destination_domain = "ja"
metric = "word"

[oracle]
kind = "glossary"
terms = [{ source = "v4", destination = "v4" }]

[[candidates]]
text = "use UUID v4"

[[candidates]]
text = "please use a v4 UUID"
"#;

    #[test]
    fn parse_glossary_job() {
        let job = Job::from_toml(GLOSSARY_JOB).unwrap();
        assert_eq!(job.metric, MetricKind::Word);
        assert_eq!(job.candidates.len(), 2);
        assert_eq!(job.source_element(), Element::tagged("use UUID", "en"));
        assert_eq!(job.oracle_description(), "glossary (1 terms)");
        assert_eq!(job.generator().len(), 2);
        assert_eq!(job.engine.concurrency, 1);
    }

    #[test]
    fn review_oracle_uses_verdicts() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "review"

[[candidates]]
text = "x"
consistent = false

[[candidates]]
text = "y"
consistent = true
"#;
        let job = Job::from_toml(input).unwrap();
        let oracle = job.build_oracle();
        let d = job.new_destination_element();
        assert!(!oracle.is_consistent(&Element::new("x"), &d).unwrap());
        assert!(oracle.is_consistent(&Element::new("y"), &d).unwrap());
        assert!(oracle.is_consistent(&Element::new("z"), &d).is_err());
    }

    #[test]
    fn review_oracle_requires_verdicts() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "review"

[[candidates]]
text = "x"
"#;
        let err = Job::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("candidate 0"));
    }

    #[test]
    fn review_rejects_conflicting_duplicates() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "review"

[[candidates]]
text = "x"
consistent = true

[[candidates]]
text = "y"
consistent = false

[[candidates]]
text = "x"
consistent = false
"#;
        let err = Job::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigValidation(_)));
        assert!(err.to_string().contains("candidates 0 and 2"));
    }

    #[test]
    fn review_allows_agreeing_duplicates() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "review"

[[candidates]]
text = "x"
consistent = true

[[candidates]]
text = "x"
consistent = true
"#;
        let job = Job::from_toml(input).unwrap();
        let oracle = job.build_oracle();
        assert!(oracle.is_consistent(&Element::new("x"), &job.new_destination_element()).unwrap());
    }

    #[test]
    fn glossary_requires_terms() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "glossary"
"#;
        let err = Job::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigValidation(_)));
    }

    #[test]
    fn unknown_oracle_kind_fails_to_parse() {
        let input = r#"
source = "a"
old_destination = "b"
new_destination = "c"

[oracle]
kind = "vibes"
"#;
        let err = Job::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigParse(_)));
    }

    #[test]
    fn metric_kinds() {
        let a = Element::new("use UUID or similar");
        let b = Element::new("use UUID v4 or similar");
        assert_eq!(MetricKind::Word.distance(&b, &a).unwrap(), 0.2);
        assert!(MetricKind::Char.distance(&b, &a).unwrap() < 0.2);
    }
}
