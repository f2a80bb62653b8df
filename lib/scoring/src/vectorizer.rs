//! Attribute Vectorizer
//!
//! Converts product records into the two representations the distance engine
//! works on: a multi-label tag matrix over every distinct value observed per
//! attribute, and a synthesized description per record for term-frequency
//! similarity. All sets of a scoring run are vectorized in one pass so they
//! share one column space.

use crate::distance::DistanceMetric;
use ahash::AHashMap;
use pickwise_core::{AttributeSchema, ProductRecord, Source, TermVocabulary, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Token used for missing attributes when unknown tagging is enabled
pub const UNKNOWN_VALUE: &str = "unknown";

/// Vectorizer options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerOptions {
    /// Tag missing attributes as `unknown` instead of leaving them out
    #[serde(default)]
    pub tag_unknown: bool,
}

/// One column of the tag matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TagColumn {
    pub attribute: String,
    pub value: String,
}

/// A schema attribute that no record of a set carries at all.
///
/// Recovered by treating the column as empty for that set; reported so the
/// caller can see that the upstream extraction dropped a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputShapeIssue {
    pub source: Source,
    pub attribute: String,
}

impl std::fmt::Display for InputShapeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "InputShapeError: attribute '{}' is missing from every {} record",
            self.attribute, self.source
        )
    }
}

/// Vectorized form of one record set
#[derive(Debug, Clone)]
pub struct VectorizedSet {
    pub source: Source,
    /// Binary presence rows over [`Vectorized::columns`]
    pub tags: Vec<Vector>,
    /// Synthesized descriptions in schema order
    pub descriptions: Vec<String>,
    /// Term-frequency rows over [`Vectorized::vocabulary`]
    pub terms: Vec<Vector>,
}

impl VectorizedSet {
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Feature rows the given metric compares
    pub fn features(&self, metric: DistanceMetric) -> &[Vector] {
        match metric {
            DistanceMetric::TermFrequency => &self.terms,
            DistanceMetric::Tags => &self.tags,
        }
    }
}

/// Output of one vectorization pass over every set in a run
#[derive(Debug, Clone)]
pub struct Vectorized {
    pub columns: Vec<TagColumn>,
    pub vocabulary: TermVocabulary,
    pub sets: Vec<VectorizedSet>,
    pub issues: Vec<InputShapeIssue>,
}

impl Vectorized {
    pub fn set(&self, source: Source) -> Option<&VectorizedSet> {
        self.sets.iter().find(|s| s.source == source)
    }
}

/// Builds tag rows and descriptions from records against a fixed schema
#[derive(Debug, Clone)]
pub struct AttributeVectorizer {
    schema: AttributeSchema,
    options: VectorizerOptions,
}

impl AttributeVectorizer {
    pub fn new(schema: AttributeSchema, options: VectorizerOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn options(&self) -> VectorizerOptions {
        self.options
    }

    /// Schema attributes carried by no record of a non-empty set
    pub fn shape_issues(&self, source: Source, records: &[ProductRecord]) -> Vec<InputShapeIssue> {
        if records.is_empty() {
            return Vec::new();
        }
        self.schema
            .iter()
            .filter(|attribute| !records.iter().any(|r| r.has_attribute(attribute)))
            .map(|attribute| InputShapeIssue {
                source,
                attribute: attribute.to_string(),
            })
            .collect()
    }

    /// (schema position, value) pairs for a record, in schema order.
    /// Attributes listed in `absent` are treated as empty for this record's set.
    fn bag(&self, record: &ProductRecord, absent: &[usize]) -> Vec<(usize, String)> {
        let mut bag = Vec::new();
        for (position, attribute) in self.schema.iter().enumerate() {
            let values = record.normalized_values(attribute);
            if values.is_empty() {
                if self.options.tag_unknown && !absent.contains(&position) {
                    bag.push((position, UNKNOWN_VALUE.to_string()));
                }
                continue;
            }
            bag.extend(values.into_iter().map(|value| (position, value)));
        }
        bag
    }

    /// Vectorize every set of a run in a single pass
    pub fn vectorize(&self, sets: &[(Source, &[ProductRecord])]) -> Vectorized {
        let mut issues = Vec::new();
        let mut bags: Vec<(Source, Vec<Vec<(usize, String)>>)> = Vec::with_capacity(sets.len());

        for (source, records) in sets {
            let set_issues = self.shape_issues(*source, records);
            for issue in &set_issues {
                warn!("{}; treating the column as empty", issue);
            }
            let absent: Vec<usize> = set_issues
                .iter()
                .filter_map(|issue| self.schema.position(&issue.attribute))
                .collect();
            issues.extend(set_issues);

            let set_bags = records.iter().map(|r| self.bag(r, &absent)).collect();
            bags.push((*source, set_bags));
        }

        // Tag columns: schema order, then value order within an attribute
        let mut observed: Vec<BTreeSet<String>> = vec![BTreeSet::new(); self.schema.len()];
        for (_, set_bags) in &bags {
            for bag in set_bags {
                for (position, value) in bag {
                    observed[*position].insert(value.clone());
                }
            }
        }
        let mut columns = Vec::new();
        let mut column_index: AHashMap<(usize, String), usize> = AHashMap::new();
        for (position, values) in observed.into_iter().enumerate() {
            for value in values {
                column_index.insert((position, value.clone()), columns.len());
                columns.push(TagColumn {
                    attribute: self.schema.attributes()[position].clone(),
                    value,
                });
            }
        }

        let described: Vec<(Source, Vec<String>)> = bags
            .iter()
            .map(|(source, set_bags)| {
                let descriptions = set_bags.iter().map(|bag| describe(bag)).collect();
                (*source, descriptions)
            })
            .collect();

        let vocabulary = TermVocabulary::fit(
            described
                .iter()
                .flat_map(|(_, descriptions)| descriptions.iter().map(String::as_str)),
        );

        let sets = bags
            .into_iter()
            .zip(described)
            .map(|((source, set_bags), (_, descriptions))| {
                let tags = set_bags
                    .iter()
                    .map(|bag| {
                        let mut row = Vector::zeros(columns.len());
                        for (position, value) in bag {
                            if let Some(&column) = column_index.get(&(*position, value.clone())) {
                                row.as_mut_slice()[column] = 1.0;
                            }
                        }
                        row
                    })
                    .collect();
                let terms = descriptions.iter().map(|d| vocabulary.transform(d)).collect();
                VectorizedSet {
                    source,
                    tags,
                    descriptions,
                    terms,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            sets = sets.len(),
            tag_columns = columns.len(),
            terms = vocabulary.len(),
            "vectorized record sets"
        );

        Vectorized {
            columns,
            vocabulary,
            sets,
            issues,
        }
    }
}

/// Synthesized description: a bag's values in schema order
fn describe(bag: &[(usize, String)]) -> String {
    bag.iter()
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
