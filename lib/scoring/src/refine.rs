//! Prompt refinement
//!
//! A buyer prompt such as `"more red, fewer browns"` is scanned for directive
//! verbs followed by a recognized attribute value. Each hit becomes a
//! [`Directive`]: an (attribute, value) pair with a polarity. Anything the
//! grammar does not recognize is ignored.

use ahash::{AHashMap, AHashSet};
use pickwise_core::{AttributeSchema, ProductRecord};
use serde::{Deserialize, Serialize};

/// Longest attribute value, in words, a directive can name
pub const MAX_VALUE_WORDS: usize = 3;

/// Whether a directive asks for more or fewer matching products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Boost,
    Suppress,
}

impl Polarity {
    pub fn sign(&self) -> f32 {
        match self {
            Polarity::Boost => 1.0,
            Polarity::Suppress => -1.0,
        }
    }
}

/// Verb table of the directive grammar
pub const DIRECTIVE_VERBS: &[(&str, Polarity)] = &[
    ("more", Polarity::Boost),
    ("increase", Polarity::Boost),
    ("fewer", Polarity::Suppress),
    ("less", Polarity::Suppress),
    ("reduce", Polarity::Suppress),
];

/// One parsed instruction: nudge records carrying `attribute = value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Directive {
    pub attribute: String,
    pub value: String,
    pub polarity: Polarity,
}

impl Directive {
    pub fn matches(&self, record: &ProductRecord) -> bool {
        record
            .normalized_values(&self.attribute)
            .iter()
            .any(|v| collapse_whitespace(v) == self.value)
    }

    /// Signed score adjustment for a nudge of size `magnitude`
    pub fn delta(&self, magnitude: f32) -> f32 {
        self.polarity.sign() * magnitude
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Attribute values a prompt may refer to, keyed by normalized value
#[derive(Debug, Clone, Default)]
pub struct ValueLexicon {
    // value -> attributes carrying it, in schema order
    values: AHashMap<String, Vec<String>>,
}

impl ValueLexicon {
    /// Collect every value of every schema attribute seen in `records`
    pub fn from_records<'a, I>(schema: &AttributeSchema, records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductRecord>,
    {
        let records: Vec<&ProductRecord> = records.into_iter().collect();
        let mut values: AHashMap<String, Vec<String>> = AHashMap::new();
        for attribute in schema.iter() {
            for record in &records {
                for value in record.normalized_values(attribute) {
                    let attributes = values.entry(collapse_whitespace(&value)).or_default();
                    if !attributes.iter().any(|a| a == attribute) {
                        attributes.push(attribute.to_string());
                    }
                }
            }
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve a phrase to a known value, tolerating a plural suffix
    pub fn lookup(&self, phrase: &str) -> Option<(&str, &[String])> {
        let candidates = [
            Some(phrase),
            phrase.strip_suffix('s'),
            phrase.strip_suffix("es"),
        ];
        candidates.into_iter().flatten().find_map(|candidate| {
            self.values
                .get_key_value(candidate)
                .map(|(value, attributes)| (value.as_str(), attributes.as_slice()))
        })
    }
}

/// Table-driven parser for refinement prompts
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    verbs: Vec<(String, Polarity)>,
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self {
            verbs: DIRECTIVE_VERBS
                .iter()
                .map(|(verb, polarity)| (verb.to_string(), *polarity))
                .collect(),
        }
    }
}

impl DirectiveParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override a verb
    #[must_use]
    pub fn with_verb(mut self, verb: &str, polarity: Polarity) -> Self {
        let verb = verb.trim().to_lowercase();
        match self.verbs.iter_mut().find(|(v, _)| *v == verb) {
            Some(entry) => entry.1 = polarity,
            None => self.verbs.push((verb, polarity)),
        }
        self
    }

    fn polarity_of(&self, word: &str) -> Option<Polarity> {
        self.verbs
            .iter()
            .find(|(verb, _)| verb == word)
            .map(|(_, polarity)| *polarity)
    }

    /// Directives found in `prompt`, in prompt order, without duplicates
    pub fn parse(&self, prompt: &str, lexicon: &ValueLexicon) -> Vec<Directive> {
        let lowered = prompt.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut directives = Vec::new();
        let mut seen = AHashSet::new();
        let mut i = 0;
        while i < words.len() {
            let Some(polarity) = self.polarity_of(words[i]) else {
                i += 1;
                continue;
            };

            let start = i + 1;
            let longest = MAX_VALUE_WORDS.min(words.len() - start);
            let mut consumed = 0;
            for len in (1..=longest).rev() {
                let phrase = words[start..start + len].join(" ");
                if let Some((value, attributes)) = lexicon.lookup(&phrase) {
                    for attribute in attributes {
                        let directive = Directive {
                            attribute: attribute.clone(),
                            value: value.to_string(),
                            polarity,
                        };
                        if seen.insert(directive.clone()) {
                            directives.push(directive);
                        }
                    }
                    consumed = len;
                    break;
                }
            }
            i = start + consumed;
        }
        directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickwise_core::Source;

    fn lexicon() -> ValueLexicon {
        let schema = AttributeSchema::new(["color", "print", "neckline"]).unwrap();
        let records = vec![
            ProductRecord::new("a", Source::Candidate)
                .with_attribute("color", "Red")
                .with_attribute("print", "solid"),
            ProductRecord::new("b", Source::Candidate)
                .with_attribute("color", "brown")
                .with_attribute("neckline", "crew neck")
                .with_attribute("print", "red"),
        ];
        ValueLexicon::from_records(&schema, &records)
    }

    #[test]
    fn test_more_and_fewer() {
        let directives = DirectiveParser::new().parse("More brown, fewer solid please", &lexicon());
        assert_eq!(
            directives,
            vec![
                Directive {
                    attribute: "color".into(),
                    value: "brown".into(),
                    polarity: Polarity::Boost
                },
                Directive {
                    attribute: "print".into(),
                    value: "solid".into(),
                    polarity: Polarity::Suppress
                },
            ]
        );
    }

    #[test]
    fn test_value_shared_by_attributes() {
        let directives = DirectiveParser::new().parse("more red", &lexicon());
        let attributes: Vec<&str> = directives.iter().map(|d| d.attribute.as_str()).collect();
        assert_eq!(attributes, vec!["color", "print"]);
    }

    #[test]
    fn test_plural_and_multi_word_values() {
        let directives = DirectiveParser::new().parse("reduce browns and more crew neck", &lexicon());
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].value, "brown");
        assert_eq!(directives[0].polarity, Polarity::Suppress);
        assert_eq!(directives[1].value, "crew neck");
        assert_eq!(directives[1].attribute, "neckline");
    }

    #[test]
    fn test_unrecognized_tokens_ignored() {
        let parser = DirectiveParser::new();
        assert!(parser.parse("more sparkle, fewer gold", &lexicon()).is_empty());
        assert!(parser.parse("", &lexicon()).is_empty());
        assert!(parser.parse("more", &lexicon()).is_empty());
    }

    #[test]
    fn test_duplicate_directives_collapse() {
        let directives = DirectiveParser::new().parse("more brown, more brown", &lexicon());
        assert_eq!(directives.len(), 1);
    }

    #[test]
    fn test_custom_verb() {
        let parser = DirectiveParser::new().with_verb("drop", Polarity::Suppress);
        let directives = parser.parse("drop solid", &lexicon());
        assert_eq!(directives[0].polarity, Polarity::Suppress);
    }

    #[test]
    fn test_directive_matches_record() {
        let directive = Directive {
            attribute: "color".into(),
            value: "red".into(),
            polarity: Polarity::Boost,
        };
        let red = ProductRecord::new("r", Source::Candidate).with_attribute("color", "RED");
        let blue = ProductRecord::new("b", Source::Candidate).with_attribute("color", "blue");

        assert!(directive.matches(&red));
        assert!(!directive.matches(&blue));
        assert!((directive.delta(0.1) - 0.1).abs() < 1e-6);
    }
}
