//! # PickWise
//!
//! Buyability scoring for candidate product designs.
//!
//! PickWise ranks a batch of candidate designs by how new they are to the
//! brand, how new they are to the market, how much they add to the batch's
//! variety and how completely they are described. The ranking can be refined
//! with a short buyer prompt such as "more florals, fewer browns".
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! pickwise --candidates candidates.json --brand-history history.json \
//!     --competitors market.json --top-n 12 --prompt "more red"
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use pickwise::prelude::*;
//!
//! let schema = AttributeSchema::new(["color", "material", "print"]).unwrap();
//! let candidates = vec![
//!     ProductRecord::new("c1", Source::Candidate)
//!         .with_attribute("color", "red")
//!         .with_attribute("material", "silk"),
//!     ProductRecord::new("c2", Source::Candidate)
//!         .with_attribute("color", "sage")
//!         .with_attribute("material", "linen"),
//! ];
//! let competitors = vec![ProductRecord::new("m1", Source::Competitor)
//!     .with_attribute("color", "red")
//!     .with_attribute("material", "silk")];
//!
//! let scorer = BuyabilityScorer::new(schema, ScoringOptions::default());
//! let inputs = ScoringInputs::new(candidates, Vec::new(), competitors);
//! let scored = scorer.score(&inputs, &WeightConfig::default());
//!
//! let list = scorer.recommender().recommend(scored.records(), 12, None);
//! assert_eq!(list.items[0].id().to_string(), "c2");
//! ```
//!
//! ## Crate Structure
//!
//! - `pickwise-core` - Product records, attribute schema, dense vectors, tokenizer
//! - `pickwise-scoring` - Vectorizer, distances, components, aggregation, recommendation

// Re-export core types
pub use pickwise_core::{
    AttributeSchema, AttributeValues, Error, ProductId, ProductRecord, Result, SchemaError, Source,
    Vector, DEFAULT_ATTRIBUTES,
};

// Re-export scoring
pub use pickwise_scoring::{
    BuyabilityScorer, CompletenessStrategy, Component, ComponentScores, Directive, DistanceMetric,
    InputShapeIssue, PriceRange, RecommendRequest, RecommendResponse, RecommendedList, Recommender,
    RefinementMode, RefinementOptions, ScoreBreakdown, ScoreRecord, ScoredSet, ScoringConfig,
    ScoringInputs, ScoringOptions, ScoringStats, WeightConfig, WeightIssue,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AttributeSchema, BuyabilityScorer, CompletenessStrategy, DistanceMetric, Error,
        ProductId, ProductRecord, RecommendRequest, RecommendedList, RefinementMode, Result,
        ScoreRecord, ScoredSet, ScoringConfig, ScoringInputs, ScoringOptions, Source,
        WeightConfig,
    };
}
