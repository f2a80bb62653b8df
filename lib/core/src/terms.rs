// Term-frequency vectors over synthesized product descriptions
use ahash::AHashMap;

use crate::vector::Vector;

/// Tokenize a description for term counting.
/// Lowercases, splits on whitespace and list punctuation, and keeps hyphenated
/// values ("v-neck", "a-line") together as one term.
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/' | '|' | '(' | ')'))
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|s| !s.is_empty() && s.chars().any(char::is_alphanumeric))
        .collect()
}

/// Count term occurrences in a description
pub fn term_frequencies(text: &str) -> AHashMap<String, u32> {
    let mut term_freqs: AHashMap<String, u32> = AHashMap::new();
    for token in tokenize(text) {
        *term_freqs.entry(token).or_insert(0) += 1;
    }
    term_freqs
}

/// Shared term index for a group of documents
///
/// Every document vectorized against the same vocabulary lands in the same
/// column space, which is what makes cosine distances between sets valid.
#[derive(Debug, Clone, Default)]
pub struct TermVocabulary {
    // term -> column
    index: AHashMap<String, usize>,
    terms: Vec<String>,
}

impl TermVocabulary {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from documents; columns follow first appearance
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary = Self::new();
        for document in documents {
            for token in tokenize(document) {
                vocabulary.insert(token);
            }
        }
        vocabulary
    }

    fn insert(&mut self, term: String) {
        if !self.index.contains_key(&term) {
            self.index.insert(term.clone(), self.terms.len());
            self.terms.push(term);
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Raw term-frequency vector; terms outside the vocabulary are dropped
    pub fn transform(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.len()];
        for (term, tf) in term_frequencies(text) {
            if let Some(column) = self.column(&term) {
                data[column] = tf as f32;
            }
        }
        Vector::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_hyphenated_terms() {
        let tokens = tokenize("Red, V-Neck  crew neck; cotton");
        assert_eq!(tokens, vec!["red", "v-neck", "crew", "neck", "cotton"]);
    }

    #[test]
    fn test_tokenize_drops_punctuation_only() {
        assert_eq!(tokenize("fit & flare"), vec!["fit", "flare"]);
        assert!(tokenize("  ,; ").is_empty());
    }

    #[test]
    fn test_term_frequencies() {
        let freqs = term_frequencies("red floral red");
        assert_eq!(freqs.get("red"), Some(&2));
        assert_eq!(freqs.get("floral"), Some(&1));
    }

    #[test]
    fn test_vocabulary_shared_columns() {
        let vocabulary = TermVocabulary::fit(["red cotton", "blue cotton"]);
        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.column("red"), Some(0));
        assert_eq!(vocabulary.column("cotton"), Some(1));

        let v = vocabulary.transform("cotton cotton silk");
        assert_eq!(v.as_slice(), &[0.0, 2.0, 0.0]);
    }
}
