//! # PickWise Scoring
//!
//! Buyability scoring for candidate product designs.
//!
//! Each candidate in a batch is compared against the brand's past assortment,
//! current competitor assortments and the rest of its own batch. Four
//! component scores come out of those comparisons; they are normalized within
//! the batch and combined with configurable weights into a single buyability
//! score, which drives a top-N recommendation that a free-text prompt can
//! refine.
//!
//! ## Features
//!
//! - **Shared vectorization**: one pass per run builds tag rows and
//!   term-frequency rows in a column space shared by every set
//! - **Cached distance matrices**: one matrix per (candidate, reference) pair,
//!   rows computed in parallel
//! - **Explicit weights**: a [`WeightConfig`] per call, no global state
//! - **Prompt refinement**: a table-driven "more X / fewer Y" grammar
//! - **Explainability**: per-component contribution breakdown
//!
//! ## Example
//!
//! ```rust
//! use pickwise_core::{AttributeSchema, ProductRecord, Source};
//! use pickwise_scoring::{BuyabilityScorer, ScoringInputs, ScoringOptions, WeightConfig};
//!
//! let schema = AttributeSchema::new(["color", "print"]).unwrap();
//! let inputs = ScoringInputs::new(
//!     vec![
//!         ProductRecord::new("c1", Source::Candidate).with_attribute("color", "red"),
//!         ProductRecord::new("c2", Source::Candidate).with_attribute("color", "teal"),
//!     ],
//!     vec![ProductRecord::new("b1", Source::BrandHistory).with_attribute("color", "red")],
//!     Vec::new(),
//! );
//!
//! let scorer = BuyabilityScorer::new(schema, ScoringOptions::default());
//! let scored = scorer.score(&inputs, &WeightConfig::default());
//! let list = scorer.recommender().recommend(scored.records(), 1, Some("more red"));
//!
//! assert_eq!(list.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Records   │────>│ Vectorizer  │────>│  Distance   │
//! │ (3 sets)    │     │ (tags, tf)  │     │   Cache     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Normalizer  │<────│ Components  │
//!                     │  (min-max)  │     │ (4 scores)  │
//!                     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Aggregator  │────>│ Recommender │
//!                     │  (weights)  │     │  (prompt)   │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod aggregate;
pub mod components;
pub mod config;
pub mod distance;
pub mod explain;
pub mod normalize;
pub mod pipeline;
pub mod recommend;
pub mod refine;
pub mod scored;
pub mod vectorizer;

pub use aggregate::{rank_order, Aggregator, WeightConfig, WeightIssue};
pub use components::{
    CompletenessStrategy, Component, ComponentScores, ComponentTable, ScoreComponents,
    DEFAULT_COVERAGE_THRESHOLD,
};
pub use config::{ScoringConfig, ScoringOptions};
pub use distance::{DistanceCache, DistanceEngine, DistanceMatrix, DistanceMetric, NEUTRAL_DISTANCE};
pub use explain::{RecommendResponse, ScoreBreakdown, ScoringStats};
pub use normalize::{min_max, NEUTRAL_SCORE};
pub use pipeline::{BuyabilityScorer, ScoringInputs};
pub use recommend::{
    PriceRange, RecommendRequest, RecommendedList, Recommender, RefinementMode, RefinementOptions,
    DEFAULT_NUDGE_DELTA, DEFAULT_TOP_N,
};
pub use refine::{Directive, DirectiveParser, Polarity, ValueLexicon, DIRECTIVE_VERBS};
pub use scored::{ScoreRecord, ScoredSet};
pub use vectorizer::{AttributeVectorizer, InputShapeIssue, TagColumn, Vectorized, VectorizerOptions};
