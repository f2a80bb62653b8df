//! Scoring configuration
//!
//! Everything a scoring run depends on is carried in explicit values; nothing
//! is read from the environment. A [`ScoringConfig`] is usually loaded from a
//! JSON document in which every field is optional:
//!
//! ```json
//! {
//!   "schema": ["color", "material", "print"],
//!   "options": {
//!     "metric": "tags",
//!     "completeness": {"strategy": "batch_coverage", "threshold": 5},
//!     "tag_unknown": true,
//!     "refinement": {"mode": "filter", "nudge_delta": 0.1}
//!   },
//!   "weights": {"newness_to_market": 0.5}
//! }
//! ```

use crate::aggregate::WeightConfig;
use crate::components::CompletenessStrategy;
use crate::distance::DistanceMetric;
use crate::recommend::RefinementOptions;
use crate::vectorizer::VectorizerOptions;
use pickwise_core::{AttributeSchema, Error, Result};
use serde::{Deserialize, Serialize};

/// Options selecting the algorithms of a scoring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOptions {
    pub metric: DistanceMetric,
    pub completeness: CompletenessStrategy,
    /// Tag missing attributes as `unknown`
    pub tag_unknown: bool,
    pub refinement: RefinementOptions,
}

impl ScoringOptions {
    pub fn vectorizer_options(&self) -> VectorizerOptions {
        VectorizerOptions {
            tag_unknown: self.tag_unknown,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let delta = self.refinement.nudge_delta;
        if !delta.is_finite() || delta < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "nudge_delta must be a non-negative number, got {}",
                delta
            )));
        }
        Ok(())
    }
}

/// Complete configuration of a scoring run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub schema: AttributeSchema,
    pub options: ScoringOptions,
    pub weights: WeightConfig,
}

// Wire form of a configuration document. The schema is validated after
// parsing so a bad attribute list surfaces as `Error::InvalidSchema`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    schema: Option<Vec<String>>,
    options: ScoringOptions,
    weights: WeightConfig,
}

impl ScoringConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: ConfigDocument = serde_json::from_str(json)?;
        let schema = match document.schema {
            Some(attributes) => AttributeSchema::new(attributes)?,
            None => AttributeSchema::default(),
        };
        document.options.validate()?;
        Ok(Self {
            schema,
            options: document.options,
            weights: document.weights,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::RefinementMode;
    use pickwise_core::SchemaError;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ScoringConfig::from_json("{}").unwrap();
        assert_eq!(config, ScoringConfig::default());
        assert_eq!(config.schema.len(), 10);
        assert_eq!(config.options.metric, DistanceMetric::TermFrequency);
        assert_eq!(config.options.completeness, CompletenessStrategy::PerItem);
    }

    #[test]
    fn test_full_document() {
        let config = ScoringConfig::from_json(
            r#"{
                "schema": ["color", "print"],
                "options": {
                    "metric": "tags",
                    "completeness": {"strategy": "batch_coverage", "threshold": 3},
                    "tag_unknown": true,
                    "refinement": {"mode": "filter", "nudge_delta": 0.25}
                },
                "weights": {"variety": 0.9}
            }"#,
        )
        .unwrap();

        assert_eq!(config.schema.attributes(), &["color", "print"]);
        assert_eq!(config.options.metric, DistanceMetric::Tags);
        assert_eq!(
            config.options.completeness,
            CompletenessStrategy::BatchCoverage { threshold: 3 }
        );
        assert!(config.options.vectorizer_options().tag_unknown);
        assert_eq!(config.options.refinement.mode, RefinementMode::Filter);
        assert_eq!(config.weights.variety, 0.9);
        assert_eq!(config.weights.newness_to_market, 0.4);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let err = ScoringConfig::from_json(r#"{"schema": ["color", "color"]}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSchema(SchemaError::DuplicateAttribute(ref name)) if name == "color"
        ));

        let err = ScoringConfig::from_json(r#"{"schema": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(SchemaError::EmptySchema)));

        let err = ScoringConfig::from_json(r#"{"schema": "color"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_negative_nudge_is_rejected() {
        let err = ScoringConfig::from_json(r#"{"options": {"refinement": {"nudge_delta": -1}}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_round_trip_json() {
        let config = ScoringConfig::default();
        let parsed = ScoringConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
