use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Values recorded for one attribute. Most attributes carry one or two values.
pub type AttributeValues = SmallVec<[String; 2]>;

/// Where a record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A new design under evaluation
    #[default]
    Candidate,
    /// The brand's own past assortment
    BrandHistory,
    /// A competitor's current assortment
    Competitor,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Candidate => "candidate",
            Source::BrandHistory => "brand_history",
            Source::Competitor => "competitor",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Integer(u64),
    Uuid(Uuid),
    String(String),
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::String(s) => write!(f, "{}", s),
            ProductId::Uuid(u) => write!(f, "{}", u),
            ProductId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        ProductId::String(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId::String(s.to_string())
    }
}

impl From<u64> for ProductId {
    fn from(i: u64) -> Self {
        ProductId::Integer(i)
    }
}

impl From<Uuid> for ProductId {
    fn from(u: Uuid) -> Self {
        ProductId::Uuid(u)
    }
}

/// A product with categorical attributes and an opaque passthrough payload
///
/// Records are produced upstream (scrapers, image taggers) and treated as
/// immutable inputs by the scoring engine. An attribute that is absent from
/// `attributes` is *missing*; an attribute whose value is the literal string
/// `"unknown"` is an explicit value and is kept as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    #[serde(default)]
    pub source: Source,
    #[serde(default, deserialize_with = "deserialize_attributes")]
    pub attributes: BTreeMap<String, AttributeValues>,
    #[serde(
        default,
        deserialize_with = "deserialize_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    /// Image reference, title and anything else the caller wants carried through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

// Accepts `"red"`, `["red", "white"]`, scalars such as `5`, or `null`
// (missing) per attribute. Objects and nested arrays carry no usable value
// and are dropped.
fn deserialize_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, AttributeValues>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            let values: AttributeValues = match value {
                Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
                other => smallvec![scalar_text(other)?],
            };
            Some((name, values))
        })
        .collect())
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// Numbers pass through; strings such as "₹1,299" or "$ 49.90" have their
// currency marks and group separators stripped. Anything else is no price.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(&s),
        _ => None,
    };
    Ok(price.filter(|p| p.is_finite()))
}

/// Read a price out of display text
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    digits.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// An input element that could not be read as a [`ProductRecord`]
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// Position in the input array
    pub index: usize,
    pub reason: String,
}

impl std::fmt::Display for RejectedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record #{} skipped: {}", self.index, self.reason)
    }
}

/// Read a JSON array of records one element at a time.
///
/// A malformed element is returned as a [`RejectedRecord`] and does not
/// affect the others. Fails only when `value` is not an array.
pub fn parse_records(value: Value) -> crate::Result<(Vec<ProductRecord>, Vec<RejectedRecord>)> {
    let Value::Array(items) = value else {
        return Err(crate::Error::Serialization(
            "expected a JSON array of product records".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<ProductRecord>(item) {
            Ok(record) => records.push(record),
            Err(err) => rejected.push(RejectedRecord {
                index,
                reason: err.to_string(),
            }),
        }
    }
    Ok((records, rejected))
}

impl ProductRecord {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ProductId>, source: Source) -> Self {
        Self {
            id: id.into(),
            source,
            attributes: BTreeMap::new(),
            price: None,
            payload: None,
        }
    }

    /// Add one value to an attribute, creating the attribute if needed
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Whether the record carries the attribute key at all
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Cleaned values for an attribute: trimmed, lowercased, blanks dropped,
    /// sorted and deduplicated so the result does not depend on input order.
    pub fn normalized_values(&self, name: &str) -> AttributeValues {
        let mut values: AttributeValues = self
            .attributes
            .get(name)
            .map(|raw| {
                raw.iter()
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        values.dedup();
        values
    }

    /// An attribute counts as present when it has at least one non-blank value
    pub fn is_present(&self, name: &str) -> bool {
        self.attributes
            .get(name)
            .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()))
    }

    /// Case-insensitive membership test on an attribute's values
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.attributes.get(name).is_some_and(|values| {
            values.iter().any(|v| v.trim().eq_ignore_ascii_case(value.trim()))
        })
    }

    /// Title from the passthrough payload, if the caller supplied one
    pub fn title(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|p| p.get("title"))
            .and_then(|t| t.as_str())
    }
}
