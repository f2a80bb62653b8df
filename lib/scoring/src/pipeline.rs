//! End-to-end scoring run
//!
//! vectorize -> distance matrices -> components -> normalize -> aggregate.
//! A run is a pure function of its inputs, options and weights.

use crate::aggregate::{Aggregator, WeightConfig};
use crate::components::ScoreComponents;
use crate::config::{ScoringConfig, ScoringOptions};
use crate::distance::{DistanceCache, DistanceEngine};
use crate::recommend::Recommender;
use crate::scored::{ScoreRecord, ScoredSet};
use crate::vectorizer::{AttributeVectorizer, InputShapeIssue};
use pickwise_core::{AttributeSchema, ProductRecord, Source};
use tracing::debug;

/// The three record sets of a scoring run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInputs {
    pub candidates: Vec<ProductRecord>,
    pub brand_history: Vec<ProductRecord>,
    pub competitors: Vec<ProductRecord>,
}

impl ScoringInputs {
    pub fn new(
        candidates: Vec<ProductRecord>,
        brand_history: Vec<ProductRecord>,
        competitors: Vec<ProductRecord>,
    ) -> Self {
        Self {
            candidates,
            brand_history,
            competitors,
        }
    }

    /// Split a mixed stream by each record's `source`, keeping order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ProductRecord>,
    {
        let mut inputs = Self::default();
        for record in records {
            match record.source {
                Source::Candidate => inputs.candidates.push(record),
                Source::BrandHistory => inputs.brand_history.push(record),
                Source::Competitor => inputs.competitors.push(record),
            }
        }
        inputs
    }

    pub fn set(&self, source: Source) -> &[ProductRecord] {
        match source {
            Source::Candidate => &self.candidates,
            Source::BrandHistory => &self.brand_history,
            Source::Competitor => &self.competitors,
        }
    }
}

/// Scores candidate batches against brand history and the market
#[derive(Debug, Clone)]
pub struct BuyabilityScorer {
    vectorizer: AttributeVectorizer,
    components: ScoreComponents,
    options: ScoringOptions,
}

impl BuyabilityScorer {
    pub fn new(schema: AttributeSchema, options: ScoringOptions) -> Self {
        Self {
            vectorizer: AttributeVectorizer::new(schema, options.vectorizer_options()),
            components: ScoreComponents::new(DistanceEngine::new(options.metric), options.completeness),
            options,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.schema.clone(), config.options)
    }

    pub fn schema(&self) -> &AttributeSchema {
        self.vectorizer.schema()
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Recommender sharing this scorer's schema and refinement options
    pub fn recommender(&self) -> Recommender {
        Recommender::new(self.schema().clone(), self.options.refinement)
    }

    /// Score every candidate. The result keeps candidate input order.
    pub fn score(&self, inputs: &ScoringInputs, weights: &WeightConfig) -> ScoredSet {
        let aggregator = Aggregator::new(*weights);
        let candidates = &inputs.candidates;

        if candidates.is_empty() {
            debug!("no candidates to score");
            return self.scored_set(Vec::new(), &aggregator, Vec::new());
        }

        let sets = [
            (Source::Candidate, inputs.set(Source::Candidate)),
            (Source::BrandHistory, inputs.set(Source::BrandHistory)),
            (Source::Competitor, inputs.set(Source::Competitor)),
        ];
        let vectorized = self.vectorizer.vectorize(&sets);

        let mut cache = DistanceCache::new();
        let raw = self
            .components
            .compute(self.schema(), candidates, &vectorized, &mut cache);
        let normalized = raw.normalized();
        let scores = aggregator.aggregate(&normalized);

        let records = candidates
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (record, score))| {
                ScoreRecord::new(record.clone(), raw.row(i), normalized.row(i), score)
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            brand_history = inputs.brand_history.len(),
            competitors = inputs.competitors.len(),
            matrices = cache.len(),
            "scored candidate batch"
        );

        self.scored_set(records, &aggregator, vectorized.issues)
    }

    fn scored_set(
        &self,
        records: Vec<ScoreRecord>,
        aggregator: &Aggregator,
        issues: Vec<InputShapeIssue>,
    ) -> ScoredSet {
        ScoredSet::new(
            records,
            *aggregator.weights(),
            self.options.metric,
            self.options.completeness,
            issues,
        )
    }
}
