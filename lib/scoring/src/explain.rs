//! Explainability for buyability scores
//!
//! Output structures showing how each candidate's score was composed from
//! its weighted components, plus summary statistics for a run.

use crate::aggregate::{Aggregator, WeightConfig};
use crate::components::{Component, ComponentScores};
use crate::recommend::RecommendedList;
use crate::refine::Directive;
use crate::scored::ScoreRecord;
use crate::vectorizer::InputShapeIssue;
use pickwise_core::ProductId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A recommended candidate with its score broken down per component
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub id: ProductId,
    /// Ranking score, including refinement
    pub score: f32,
    /// Score rounded for display
    pub formatted_score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Raw component values
    pub components: ComponentScores,
    /// Weighted normalized contribution of each component
    pub contributions: BTreeMap<String, f32>,
    #[serde(skip_serializing_if = "is_zero")]
    pub refinement_delta: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

impl ScoreBreakdown {
    pub fn from_scored(scored: &ScoreRecord, weights: &WeightConfig, include_payload: bool) -> Self {
        let weighted = Aggregator::new(*weights).contributions(scored.normalized());
        let contributions = Component::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), weighted.get(*c)))
            .collect();

        Self {
            id: scored.id().clone(),
            score: scored.buyability_score(),
            formatted_score: scored.formatted_score(),
            title: scored.record().title().map(str::to_string),
            components: *scored.components(),
            contributions,
            refinement_delta: scored.refinement_delta(),
            payload: if include_payload {
                scored.record().payload.clone()
            } else {
                None
            },
        }
    }

    /// Component with the largest weighted contribution
    pub fn top_component(&self) -> Option<&str> {
        self.contributions
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, _)| name.as_str())
    }
}

/// Summary statistics for a recommendation
#[derive(Debug, Clone, Serialize)]
pub struct ScoringStats {
    /// Number of candidates scored
    pub candidates_count: usize,
    /// Number of items returned
    pub results_count: usize,
    pub avg_score: f32,
    pub best_score: f32,
    /// Component that contributed most to the best item
    pub top_contributing_component: Option<String>,
}

impl ScoringStats {
    pub fn compute(results: &[ScoreBreakdown], candidates_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_component: None,
            };
        }

        let avg_score = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;
        let best = results
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap_or(&results[0]);

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score: best.score,
            top_contributing_component: best.top_component().map(str::to_string),
        }
    }
}

/// Response document for a recommendation
#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub result: Vec<ScoreBreakdown>,
    pub stats: ScoringStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Directive>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl RecommendResponse {
    pub fn new(
        list: &RecommendedList,
        weights: &WeightConfig,
        candidates_count: usize,
        issues: &[InputShapeIssue],
        include_payload: bool,
    ) -> Self {
        let result: Vec<ScoreBreakdown> = list
            .items
            .iter()
            .map(|r| ScoreBreakdown::from_scored(r, weights, include_payload))
            .collect();
        let stats = ScoringStats::compute(&result, candidates_count);
        Self {
            result,
            stats,
            directives: list.directives.clone(),
            issues: issues.iter().map(ToString::to_string).collect(),
        }
    }
}
