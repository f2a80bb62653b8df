//! # PickWise Core
//!
//! Core data model for the PickWise buyability scoring engine.
//!
//! This crate provides the fundamental data structures:
//!
//! - [`ProductRecord`] - A product with categorical attributes, price and passthrough payload
//! - [`AttributeSchema`] - The ordered list of attribute names every set is vectorized against
//! - [`Vector`] - Dense feature vector with cosine distance
//! - [`TermVocabulary`] - Term-frequency vectors over synthesized descriptions
//!
//! ## Example
//!
//! ```rust
//! use pickwise_core::{AttributeSchema, ProductRecord, Source};
//!
//! let schema = AttributeSchema::new(["color", "print"]).unwrap();
//! let record = ProductRecord::new("sku-1", Source::Candidate)
//!     .with_attribute("color", "red")
//!     .with_price(39.0);
//!
//! assert!(record.is_present("color"));
//! assert!(!record.is_present("print"));
//! assert_eq!(schema.position("print"), Some(1));
//! ```

pub mod error;
pub mod ops;
pub mod record;
pub mod schema;
pub mod terms;
pub mod vector;

pub use error::{Error, Result};
pub use record::{
    parse_price, parse_records, AttributeValues, ProductId, ProductRecord, RejectedRecord, Source,
};
pub use schema::{AttributeSchema, SchemaError, DEFAULT_ATTRIBUTES};
pub use terms::{term_frequencies, tokenize, TermVocabulary};
pub use vector::Vector;
