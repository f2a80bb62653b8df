//! Score components
//!
//! The four sub-scores of the buyability model:
//!
//! | Component           | Raw value                                         |
//! |---------------------|---------------------------------------------------|
//! | `newness_to_brand`  | mean distance to the brand's past assortment      |
//! | `newness_to_market` | mean distance to competitor assortments           |
//! | `variety`           | mean distance to the other candidates in the batch|
//! | `completeness`      | attribute coverage, per [`CompletenessStrategy`]  |

use crate::distance::{DistanceCache, DistanceEngine};
use crate::normalize::min_max;
use crate::vectorizer::Vectorized;
use pickwise_core::{AttributeSchema, ProductRecord, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Distinct values per attribute considered adequate coverage
pub const DEFAULT_COVERAGE_THRESHOLD: usize = 5;

/// Named component of the buyability score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    NewnessToBrand,
    NewnessToMarket,
    Variety,
    Completeness,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::NewnessToBrand,
        Component::NewnessToMarket,
        Component::Variety,
        Component::Completeness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::NewnessToBrand => "newness_to_brand",
            Component::NewnessToMarket => "newness_to_market",
            Component::Variety => "variety",
            Component::Completeness => "completeness",
        }
    }

    /// Parse a weight key; surrounding whitespace and case are ignored
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    /// Reference set a newness component is measured against
    pub fn reference(&self) -> Option<Source> {
        match self {
            Component::NewnessToBrand => Some(Source::BrandHistory),
            Component::NewnessToMarket => Some(Source::Competitor),
            Component::Variety | Component::Completeness => None,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four component values of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub newness_to_brand: f32,
    pub newness_to_market: f32,
    pub variety: f32,
    pub completeness: f32,
}

impl ComponentScores {
    pub fn get(&self, component: Component) -> f32 {
        match component {
            Component::NewnessToBrand => self.newness_to_brand,
            Component::NewnessToMarket => self.newness_to_market,
            Component::Variety => self.variety,
            Component::Completeness => self.completeness,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Component) -> f32) -> Self {
        Self {
            newness_to_brand: f(Component::NewnessToBrand),
            newness_to_market: f(Component::NewnessToMarket),
            variety: f(Component::Variety),
            completeness: f(Component::Completeness),
        }
    }
}

/// How attribute coverage is measured. Exactly one strategy is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CompletenessStrategy {
    /// Fraction of schema attributes the candidate itself carries
    #[default]
    PerItem,
    /// Distinct values observed per attribute across the batch, divided by
    /// `threshold` and averaged over the schema, capped at 1.0. Every
    /// candidate of the batch receives the same value.
    BatchCoverage {
        #[serde(default = "default_coverage_threshold")]
        threshold: usize,
    },
}

fn default_coverage_threshold() -> usize {
    DEFAULT_COVERAGE_THRESHOLD
}

impl CompletenessStrategy {
    pub fn batch_coverage() -> Self {
        CompletenessStrategy::BatchCoverage {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
        }
    }

    /// Completeness of every candidate, in candidate order
    pub fn score(&self, schema: &AttributeSchema, candidates: &[ProductRecord]) -> Vec<f32> {
        if schema.is_empty() {
            return vec![0.0; candidates.len()];
        }
        match *self {
            CompletenessStrategy::PerItem => candidates
                .iter()
                .map(|record| {
                    let present = schema.iter().filter(|a| record.is_present(a)).count();
                    present as f32 / schema.len() as f32
                })
                .collect(),
            CompletenessStrategy::BatchCoverage { threshold } => {
                let distinct: usize = schema
                    .iter()
                    .map(|attribute| {
                        candidates
                            .iter()
                            .flat_map(|r| r.normalized_values(attribute))
                            .collect::<BTreeSet<_>>()
                            .len()
                    })
                    .sum();
                let adequate = schema.len() as f32 * threshold.max(1) as f32;
                let coverage = (distinct as f32 / adequate).min(1.0);
                vec![coverage; candidates.len()]
            }
        }
    }
}

/// Component values of a batch, one column per component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTable {
    pub newness_to_brand: Vec<f32>,
    pub newness_to_market: Vec<f32>,
    pub variety: Vec<f32>,
    pub completeness: Vec<f32>,
}

impl ComponentTable {
    pub fn len(&self) -> usize {
        self.variety.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variety.is_empty()
    }

    pub fn column(&self, component: Component) -> &[f32] {
        match component {
            Component::NewnessToBrand => &self.newness_to_brand,
            Component::NewnessToMarket => &self.newness_to_market,
            Component::Variety => &self.variety,
            Component::Completeness => &self.completeness,
        }
    }

    pub fn row(&self, index: usize) -> ComponentScores {
        ComponentScores::from_fn(|c| self.column(c)[index])
    }

    /// Min-max normalize every column independently
    pub fn normalized(&self) -> ComponentTable {
        ComponentTable {
            newness_to_brand: min_max(&self.newness_to_brand),
            newness_to_market: min_max(&self.newness_to_market),
            variety: min_max(&self.variety),
            completeness: min_max(&self.completeness),
        }
    }
}

/// Derives the raw component table of a candidate batch
#[derive(Debug, Clone, Copy)]
pub struct ScoreComponents {
    engine: DistanceEngine,
    completeness: CompletenessStrategy,
}

impl ScoreComponents {
    pub fn new(engine: DistanceEngine, completeness: CompletenessStrategy) -> Self {
        Self { engine, completeness }
    }

    pub fn completeness_strategy(&self) -> CompletenessStrategy {
        self.completeness
    }

    /// Raw component values for `candidates`, reading distances through `cache`
    pub fn compute(
        &self,
        schema: &AttributeSchema,
        candidates: &[ProductRecord],
        vectorized: &Vectorized,
        cache: &mut DistanceCache,
    ) -> ComponentTable {
        let newness = |cache: &mut DistanceCache, reference: Source| {
            let empty = vectorized.set(reference).map_or(true, |s| s.is_empty());
            if empty && !candidates.is_empty() {
                warn!(%reference, "reference set is empty; using neutral distance");
            }
            cache
                .matrix(&self.engine, vectorized, Source::Candidate, reference)
                .row_means()
        };

        let newness_to_brand = newness(cache, Source::BrandHistory);
        let newness_to_market = newness(cache, Source::Competitor);
        let variety = cache
            .matrix(&self.engine, vectorized, Source::Candidate, Source::Candidate)
            .off_diagonal_means();
        let completeness = self.completeness.score(schema, candidates);

        debug!(
            candidates = candidates.len(),
            strategy = ?self.completeness,
            "computed score components"
        );

        ComponentTable {
            newness_to_brand,
            newness_to_market,
            variety,
            completeness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceMatrix, DistanceMetric, NEUTRAL_DISTANCE};
    use crate::vectorizer::{AttributeVectorizer, VectorizerOptions};

    fn schema() -> AttributeSchema {
        AttributeSchema::new(["color", "print", "material", "occasion"]).unwrap()
    }

    fn record(id: &str, source: Source, attributes: &[(&str, &str)]) -> ProductRecord {
        attributes
            .iter()
            .fold(ProductRecord::new(id, source), |r, (k, v)| r.with_attribute(k, v))
    }

    fn compute(
        candidates: &[ProductRecord],
        brand: &[ProductRecord],
        market: &[ProductRecord],
    ) -> ComponentTable {
        let vectorizer = AttributeVectorizer::new(schema(), VectorizerOptions::default());
        let vectorized = vectorizer.vectorize(&[
            (Source::Candidate, candidates),
            (Source::BrandHistory, brand),
            (Source::Competitor, market),
        ]);
        let components = ScoreComponents::new(
            DistanceEngine::new(DistanceMetric::TermFrequency),
            CompletenessStrategy::PerItem,
        );
        let mut cache = DistanceCache::new();
        components.compute(&schema(), candidates, &vectorized, &mut cache)
    }

    #[test]
    fn test_component_names() {
        assert_eq!(Component::from_name("variety"), Some(Component::Variety));
        assert_eq!(Component::from_name(" Newness_To_Market "), Some(Component::NewnessToMarket));
        assert_eq!(Component::from_name("price"), None);
        assert_eq!(Component::NewnessToBrand.reference(), Some(Source::BrandHistory));
    }

    #[test]
    fn test_per_item_completeness() {
        let candidates = vec![
            record("a", Source::Candidate, &[("color", "red"), ("print", "floral")]),
            record("b", Source::Candidate, &[("color", "red")]),
            record("c", Source::Candidate, &[]),
        ];
        let scores = CompletenessStrategy::PerItem.score(&schema(), &candidates);
        assert_eq!(scores, vec![0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_batch_coverage_completeness() {
        let candidates = vec![
            record("a", Source::Candidate, &[("color", "red"), ("print", "floral")]),
            record("b", Source::Candidate, &[("color", "blue"), ("print", "floral")]),
        ];
        // color: 2 distinct, print: 1, material: 0, occasion: 0 -> 3 / (4 * 5)
        let scores = CompletenessStrategy::batch_coverage().score(&schema(), &candidates);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 0.15).abs() < 1e-6);
        assert_eq!(scores[0], scores[1]);
    }

    #[test]
    fn test_batch_coverage_is_capped() {
        let candidates: Vec<ProductRecord> = ["red", "blue", "green"]
            .iter()
            .map(|c| record(c, Source::Candidate, &[("color", *c)]))
            .collect();
        let strategy = CompletenessStrategy::BatchCoverage { threshold: 0 };
        let small = AttributeSchema::new(["color"]).unwrap();
        assert_eq!(strategy.score(&small, &candidates), vec![1.0; 3]);
    }

    #[test]
    fn test_batch_coverage_with_huge_threshold() {
        let candidates = vec![
            record("a", Source::Candidate, &[("color", "red"), ("print", "floral")]),
            record("b", Source::Candidate, &[("color", "blue")]),
        ];
        let strategy: CompletenessStrategy =
            serde_json::from_str(r#"{"strategy": "batch_coverage", "threshold": 18446744073709551615}"#)
                .unwrap();
        let values = strategy.score(&schema(), &candidates);

        assert_eq!(values.len(), 2);
        for value in values {
            assert!(value.is_finite());
            assert!((0.0..=1.0).contains(&value));
            assert!(value < 1e-6);
        }
    }

    #[test]
    fn test_matrices_are_cached_per_pair() {
        let candidates = vec![
            record("a", Source::Candidate, &[("color", "red")]),
            record("b", Source::Candidate, &[("color", "blue")]),
        ];
        let brand = vec![record("x", Source::BrandHistory, &[("color", "red")])];
        let market = vec![record("y", Source::Competitor, &[("color", "green")])];

        let vectorizer = AttributeVectorizer::new(schema(), VectorizerOptions::default());
        let vectorized = vectorizer.vectorize(&[
            (Source::Candidate, candidates.as_slice()),
            (Source::BrandHistory, brand.as_slice()),
            (Source::Competitor, market.as_slice()),
        ]);
        let engine = DistanceEngine::new(DistanceMetric::TermFrequency);
        let components = ScoreComponents::new(engine, CompletenessStrategy::PerItem);

        let mut cache = DistanceCache::new();
        let table = components.compute(&schema(), &candidates, &vectorized, &mut cache);
        assert_eq!(table.variety.len(), 2);
        assert_eq!(cache.len(), 3);
        for reference in [Source::BrandHistory, Source::Competitor, Source::Candidate] {
            assert!(cache.get(Source::Candidate, reference).is_some());
        }

        let first: *const DistanceMatrix = cache.get(Source::Candidate, Source::Competitor).unwrap();
        let again: *const DistanceMatrix =
            cache.matrix(&engine, &vectorized, Source::Candidate, Source::Competitor);
        assert!(std::ptr::eq(first, again));

        components.compute(&schema(), &candidates, &vectorized, &mut cache);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_completeness_strategy_serde() {
        let parsed: CompletenessStrategy =
            serde_json::from_str(r#"{"strategy": "batch_coverage"}"#).unwrap();
        assert_eq!(parsed, CompletenessStrategy::batch_coverage());

        let per_item: CompletenessStrategy =
            serde_json::from_str(r#"{"strategy": "per_item"}"#).unwrap();
        assert_eq!(per_item, CompletenessStrategy::PerItem);
    }

    #[test]
    fn test_empty_references_are_neutral() {
        let candidates = vec![
            record("a", Source::Candidate, &[("color", "red")]),
            record("b", Source::Candidate, &[("color", "blue")]),
        ];
        let table = compute(&candidates, &[], &[]);

        assert_eq!(table.newness_to_brand, vec![NEUTRAL_DISTANCE; 2]);
        assert_eq!(table.newness_to_market, vec![NEUTRAL_DISTANCE; 2]);
    }

    #[test]
    fn test_single_candidate_variety_is_zero() {
        let candidates = vec![record("a", Source::Candidate, &[("color", "red")])];
        let brand = vec![record("b", Source::BrandHistory, &[("color", "red")])];
        let table = compute(&candidates, &brand, &[]);

        assert_eq!(table.variety, vec![0.0]);
        assert!(table.newness_to_brand[0].abs() < 1e-6);
    }

    #[test]
    fn test_novel_candidate_scores_higher_newness() {
        let candidates = vec![
            record("familiar", Source::Candidate, &[("color", "black"), ("material", "cotton")]),
            record("novel", Source::Candidate, &[("color", "teal"), ("material", "satin")]),
        ];
        let market = vec![
            record("m1", Source::Competitor, &[("color", "black"), ("material", "cotton")]),
            record("m2", Source::Competitor, &[("color", "black"), ("material", "denim")]),
        ];
        let table = compute(&candidates, &[], &market);

        assert!(table.newness_to_market[1] > table.newness_to_market[0]);
    }

    #[test]
    fn test_normalized_table() {
        let table = ComponentTable {
            newness_to_brand: vec![0.2, 0.4],
            newness_to_market: vec![0.5, 0.5],
            variety: vec![0.0, 1.0],
            completeness: vec![1.0, 0.0],
        };
        let normalized = table.normalized();
        assert_eq!(normalized.newness_to_brand, vec![0.0, 1.0]);
        assert_eq!(normalized.newness_to_market, vec![0.5, 0.5]);
        assert_eq!(normalized.row(1).completeness, 0.0);
    }
}
