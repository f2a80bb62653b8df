//! Weighted aggregation of normalized components into a buyability score

use crate::components::{Component, ComponentScores, ComponentTable};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::warn;

/// Per-component weights. Weights are non-negative and need not sum to 1.
///
/// Missing keys fall back to the baseline 0.2 / 0.4 / 0.2 / 0.2, unknown keys
/// are ignored when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub newness_to_brand: f32,
    pub newness_to_market: f32,
    pub variety: f32,
    pub completeness: f32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            newness_to_brand: 0.2,
            newness_to_market: 0.4,
            variety: 0.2,
            completeness: 0.2,
        }
    }
}

/// A weight entry that was ignored or replaced by its default
#[derive(Debug, Clone, PartialEq)]
pub enum WeightIssue {
    UnrecognizedKey(String),
    Invalid { component: Component, value: f32 },
}

impl std::fmt::Display for WeightIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightIssue::UnrecognizedKey(key) => write!(f, "unrecognized weight key '{}'", key),
            WeightIssue::Invalid { component, value } => write!(
                f,
                "invalid weight {} for '{}', using default",
                value, component
            ),
        }
    }
}

impl WeightConfig {
    pub fn new(newness_to_brand: f32, newness_to_market: f32, variety: f32, completeness: f32) -> Self {
        Self {
            newness_to_brand,
            newness_to_market,
            variety,
            completeness,
        }
    }

    pub fn get(&self, component: Component) -> f32 {
        match component {
            Component::NewnessToBrand => self.newness_to_brand,
            Component::NewnessToMarket => self.newness_to_market,
            Component::Variety => self.variety,
            Component::Completeness => self.completeness,
        }
    }

    fn slot(&mut self, component: Component) -> &mut f32 {
        match component {
            Component::NewnessToBrand => &mut self.newness_to_brand,
            Component::NewnessToMarket => &mut self.newness_to_market,
            Component::Variety => &mut self.variety,
            Component::Completeness => &mut self.completeness,
        }
    }

    /// Copy with one weight replaced
    #[must_use]
    pub fn with(mut self, component: Component, weight: f32) -> Self {
        *self.slot(component) = weight;
        self
    }

    /// Apply loose key/value overrides on top of these weights.
    /// Unknown keys are reported and skipped.
    pub fn with_pairs<I, K>(self, pairs: I) -> (Self, Vec<WeightIssue>)
    where
        I: IntoIterator<Item = (K, f32)>,
        K: AsRef<str>,
    {
        let mut weights = self;
        let mut issues = Vec::new();
        for (key, value) in pairs {
            match Component::from_name(key.as_ref()) {
                Some(component) => weights = weights.with(component, value),
                None => issues.push(WeightIssue::UnrecognizedKey(key.as_ref().to_string())),
            }
        }
        let (weights, invalid) = weights.sanitized();
        issues.extend(invalid);
        (weights, issues)
    }

    /// Replace negative or non-finite weights with their defaults
    pub fn sanitized(&self) -> (Self, Vec<WeightIssue>) {
        let defaults = Self::default();
        let mut weights = *self;
        let mut issues = Vec::new();
        for component in Component::ALL {
            let value = weights.get(component);
            if !value.is_finite() || value < 0.0 {
                issues.push(WeightIssue::Invalid { component, value });
                *weights.slot(component) = defaults.get(component);
            }
        }
        (weights, issues)
    }

    pub fn total(&self) -> f32 {
        Component::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Weighted sum over normalized component scores
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    weights: WeightConfig,
}

impl Aggregator {
    /// Create an aggregator; malformed weights fall back to defaults
    pub fn new(weights: WeightConfig) -> Self {
        let (weights, issues) = weights.sanitized();
        for issue in &issues {
            warn!("{}", issue);
        }
        Self { weights }
    }

    pub fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    /// Weighted contribution of each component
    pub fn contributions(&self, normalized: &ComponentScores) -> ComponentScores {
        ComponentScores::from_fn(|c| self.weights.get(c) * normalized.get(c))
    }

    pub fn score(&self, normalized: &ComponentScores) -> f32 {
        let contributions = self.contributions(normalized);
        Component::ALL.iter().map(|c| contributions.get(*c)).sum()
    }

    /// Buyability score of every row of a normalized table
    pub fn aggregate(&self, normalized: &ComponentTable) -> Vec<f32> {
        (0..normalized.len())
            .map(|i| self.score(&normalized.row(i)))
            .collect()
    }
}

/// Indices ordered by descending score; ties keep insertion order
pub fn rank_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by_key is stable
    order.sort_by_key(|&i| Reverse(OrderedFloat(sanitize_score(scores[i]))));
    order
}

// NaN would otherwise sort above every real score
fn sanitize_score(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
