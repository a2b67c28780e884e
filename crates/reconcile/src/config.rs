use std::time::Duration;

use serde::Deserialize;

use crate::error::ReconcileError;
use crate::model::ReconcileOptions;
use crate::prompt::DeltaPrompt;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub max_candidates: Option<usize>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(default)]
    pub include_source: bool,
}

fn default_concurrency() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_candidates: None,
            tolerance: None,
            deadline_ms: None,
            include_source: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.concurrency == 0 {
            return Err(ReconcileError::ConfigValidation(
                "engine.concurrency must be at least 1".into(),
            ));
        }

        if self.max_candidates == Some(0) {
            return Err(ReconcileError::ConfigValidation(
                "engine.max_candidates must be at least 1".into(),
            ));
        }

        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ReconcileError::ConfigValidation(format!(
                    "engine.tolerance must be a finite non-negative number, got {tolerance}"
                )));
            }
        }

        if self.deadline_ms == Some(0) {
            return Err(ReconcileError::ConfigValidation(
                "engine.deadline_ms must be positive".into(),
            ));
        }

        Ok(())
    }

    pub fn to_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            concurrency: self.concurrency.max(1),
            max_candidates: self.max_candidates,
            tolerance: self.tolerance,
            include_source: self.include_source,
            deadline: self.deadline_ms.map(Duration::from_millis),
            ..ReconcileOptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptConfig {
    /// Overrides the built-in delta prompt.
    #[serde(default)]
    pub template: Option<String>,
}

impl PromptConfig {
    pub fn build(&self) -> Result<DeltaPrompt, ReconcileError> {
        match &self.template {
            Some(template) => DeltaPrompt::new(template.as_str()).map_err(ReconcileError::ConfigValidation),
            None => Ok(DeltaPrompt::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.engine.validate()?;
        self.prompt.build()?;
        Ok(())
    }

    pub fn options(&self) -> ReconcileOptions {
        self.engine.to_options()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
