//! Scored records produced by a scoring run

use crate::aggregate::{rank_order, WeightConfig};
use crate::components::{CompletenessStrategy, ComponentScores};
use crate::distance::DistanceMetric;
use crate::vectorizer::InputShapeIssue;
use pickwise_core::{ProductId, ProductRecord};
use serde::Serialize;

/// A candidate with its component scores and buyability score
///
/// Created once per scoring run and never modified; refinement produces a
/// new record through [`ScoreRecord::nudged`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    record: ProductRecord,
    /// Raw component values before normalization
    components: ComponentScores,
    normalized: ComponentScores,
    buyability_score: f32,
    #[serde(skip_serializing_if = "is_zero")]
    refinement_delta: f32,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

impl ScoreRecord {
    pub fn new(
        record: ProductRecord,
        components: ComponentScores,
        normalized: ComponentScores,
        buyability_score: f32,
    ) -> Self {
        Self {
            record,
            components,
            normalized,
            buyability_score,
            refinement_delta: 0.0,
        }
    }

    pub fn record(&self) -> &ProductRecord {
        &self.record
    }

    pub fn id(&self) -> &ProductId {
        &self.record.id
    }

    pub fn components(&self) -> &ComponentScores {
        &self.components
    }

    pub fn normalized(&self) -> &ComponentScores {
        &self.normalized
    }

    /// Ranking score, including any refinement adjustment
    pub fn buyability_score(&self) -> f32 {
        self.buyability_score
    }

    /// Score as aggregated, before refinement
    pub fn base_score(&self) -> f32 {
        self.buyability_score - self.refinement_delta
    }

    pub fn refinement_delta(&self) -> f32 {
        self.refinement_delta
    }

    /// Score rounded to two decimals for display
    pub fn formatted_score(&self) -> String {
        format!("{:.2}", self.buyability_score)
    }

    /// New record with the ranking score shifted by `delta`
    #[must_use]
    pub fn nudged(&self, delta: f32) -> Self {
        Self {
            buyability_score: self.buyability_score + delta,
            refinement_delta: self.refinement_delta + delta,
            ..self.clone()
        }
    }
}

/// All candidates of a run, in input order
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSet {
    records: Vec<ScoreRecord>,
    weights: WeightConfig,
    metric: DistanceMetric,
    completeness: CompletenessStrategy,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<InputShapeIssue>,
}

impl ScoredSet {
    pub fn new(
        records: Vec<ScoreRecord>,
        weights: WeightConfig,
        metric: DistanceMetric,
        completeness: CompletenessStrategy,
        issues: Vec<InputShapeIssue>,
    ) -> Self {
        Self {
            records,
            weights,
            metric,
            completeness,
            issues,
        }
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ScoreRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Completeness strategy that produced the completeness component
    pub fn completeness_strategy(&self) -> CompletenessStrategy {
        self.completeness
    }

    /// Recovered input-shape conditions seen while vectorizing
    pub fn issues(&self) -> &[InputShapeIssue] {
        &self.issues
    }

    pub fn get(&self, id: &ProductId) -> Option<&ScoreRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Records by descending buyability score, ties in input order
    pub fn ranked(&self) -> Vec<&ScoreRecord> {
        let scores: Vec<f32> = self.records.iter().map(|r| r.buyability_score()).collect();
        rank_order(&scores)
            .into_iter()
            .map(|i| &self.records[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickwise_core::Source;

    fn score_record(id: &str, score: f32) -> ScoreRecord {
        ScoreRecord::new(
            ProductRecord::new(id, Source::Candidate),
            ComponentScores::default(),
            ComponentScores::default(),
            score,
        )
    }

    #[test]
    fn test_nudged_is_a_new_record() {
        let original = score_record("a", 0.5);
        let nudged = original.nudged(0.1);

        assert_eq!(original.buyability_score(), 0.5);
        assert!((nudged.buyability_score() - 0.6).abs() < 1e-6);
        assert!((nudged.base_score() - 0.5).abs() < 1e-6);
        assert!((nudged.refinement_delta() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_formatted_score() {
        assert_eq!(score_record("a", 0.73456).formatted_score(), "0.73");
    }

    #[test]
    fn test_ranked_is_stable() {
        let set = ScoredSet::new(
            vec![
                score_record("a", 0.4),
                score_record("b", 0.8),
                score_record("c", 0.4),
            ],
            WeightConfig::default(),
            DistanceMetric::default(),
            CompletenessStrategy::default(),
            Vec::new(),
        );
        let ids: Vec<String> = set.ranked().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(set.get(&ProductId::from("c")).is_some());
    }

    #[test]
    fn test_serialized_record_omits_zero_delta() {
        let json = serde_json::to_value(score_record("a", 0.5)).unwrap();
        assert!(json.get("refinement_delta").is_none());
        assert_eq!(json["record"]["id"], "a");
    }
}
