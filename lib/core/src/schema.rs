//! Attribute schema definitions
//!
//! The schema is the fixed, ordered list of attribute names the scoring
//! engine recognizes. Every set of records in a scoring run is vectorized
//! against the same schema so that cross-set distances are well defined.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Attributes extracted for apparel by the upstream taggers
pub const DEFAULT_ATTRIBUTES: &[&str] = &[
    "color",
    "material",
    "style",
    "length",
    "occasion",
    "pattern",
    "neckline",
    "sleeve_type",
    "print",
    "texture",
];

/// Ordered list of recognized attribute names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AttributeSchema {
    attributes: Vec<String>,
}

impl AttributeSchema {
    /// Create a schema, rejecting empty, blank or duplicated attribute names
    pub fn new<I, S>(attributes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes: Vec<String> = attributes
            .into_iter()
            .map(|a| a.into().trim().to_string())
            .collect();

        if attributes.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut seen = HashSet::with_capacity(attributes.len());
        for (position, name) in attributes.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::BlankAttribute(position));
            }
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateAttribute(name.clone()));
            }
        }

        Ok(Self { attributes })
    }

    /// Attribute names in schema order
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self {
            attributes: DEFAULT_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for AttributeSchema {
    type Error = SchemaError;

    fn try_from(attributes: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(attributes)
    }
}

impl From<AttributeSchema> for Vec<String> {
    fn from(schema: AttributeSchema) -> Self {
        schema.attributes
    }
}

/// Errors that can occur during schema validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Attribute at position {0} has a blank name")]
    BlankAttribute(usize),

    #[error("Attribute '{0}' appears more than once")]
    DuplicateAttribute(String),
}
