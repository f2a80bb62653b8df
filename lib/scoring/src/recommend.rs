//! Top-N recommendation with optional prompt refinement

use crate::aggregate::rank_order;
use crate::refine::{Directive, DirectiveParser, Polarity, ValueLexicon};
use crate::scored::ScoreRecord;
use ahash::AHashSet;
use pickwise_core::AttributeSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default size of a recommended list
pub const DEFAULT_TOP_N: usize = 12;

/// Default score shift applied by one directive
pub const DEFAULT_NUDGE_DELTA: f32 = 0.1;

/// How a refinement prompt changes the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementMode {
    /// Shift scores of matching candidates, then re-rank
    #[default]
    Nudge,
    /// Keep only matching candidates, backfilling from the rest
    Filter,
}

/// Refinement settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefinementOptions {
    #[serde(default)]
    pub mode: RefinementMode,
    #[serde(default = "default_nudge_delta")]
    pub nudge_delta: f32,
}

fn default_nudge_delta() -> f32 {
    DEFAULT_NUDGE_DELTA
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            mode: RefinementMode::default(),
            nudge_delta: DEFAULT_NUDGE_DELTA,
        }
    }
}

/// Inclusive price band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether a price falls inside the band. Unpriced records only pass an
    /// unbounded range.
    pub fn contains(&self, price: Option<f64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(price) = price else {
            return false;
        };
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Parameters of one recommendation call
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub top_n: usize,
    pub prompt: Option<String>,
    pub price: PriceRange,
}

impl Default for RecommendRequest {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            prompt: None,
            price: PriceRange::default(),
        }
    }
}

impl RecommendRequest {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: PriceRange) -> Self {
        self.price = price;
        self
    }
}

/// Ordered recommendation output
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecommendedList {
    pub items: Vec<ScoreRecord>,
    /// Directives recognized in the prompt
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Directive>,
    /// Items added from the non-matching pool in filter mode
    #[serde(skip_serializing_if = "is_zero")]
    pub backfilled: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl RecommendedList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.items
    }
}

/// Selects the top-N candidates of a scored set
#[derive(Debug, Clone)]
pub struct Recommender {
    schema: AttributeSchema,
    options: RefinementOptions,
    parser: DirectiveParser,
}

impl Recommender {
    pub fn new(schema: AttributeSchema, options: RefinementOptions) -> Self {
        Self {
            schema,
            options,
            parser: DirectiveParser::default(),
        }
    }

    /// Replace the directive grammar
    #[must_use]
    pub fn with_parser(mut self, parser: DirectiveParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn options(&self) -> RefinementOptions {
        self.options
    }

    pub fn recommend(&self, records: &[ScoreRecord], top_n: usize, prompt: Option<&str>) -> RecommendedList {
        let request = RecommendRequest {
            top_n,
            prompt: prompt.map(str::to_string),
            price: PriceRange::default(),
        };
        self.recommend_with(records, &request)
    }

    pub fn recommend_with(&self, records: &[ScoreRecord], request: &RecommendRequest) -> RecommendedList {
        let mut seen = AHashSet::new();
        let pool: Vec<&ScoreRecord> = records
            .iter()
            .filter(|r| seen.insert(r.id().clone()))
            .filter(|r| request.price.contains(r.record().price))
            .collect();

        let directives = match request.prompt.as_deref() {
            Some(prompt) => {
                let lexicon = ValueLexicon::from_records(&self.schema, pool.iter().map(|r| r.record()));
                self.parser.parse(prompt, &lexicon)
            }
            None => Vec::new(),
        };

        debug!(
            pool = pool.len(),
            directives = directives.len(),
            top_n = request.top_n,
            mode = ?self.options.mode,
            "recommending"
        );

        let (items, backfilled) = match self.options.mode {
            RefinementMode::Nudge => (self.nudge(&pool, &directives, request.top_n), 0),
            RefinementMode::Filter => self.filter(&pool, &directives, request.top_n),
        };

        RecommendedList {
            items,
            directives,
            backfilled,
        }
    }

    fn nudge(&self, pool: &[&ScoreRecord], directives: &[Directive], top_n: usize) -> Vec<ScoreRecord> {
        let nudged: Vec<ScoreRecord> = pool
            .iter()
            .map(|record| {
                let delta: f32 = directives
                    .iter()
                    .filter(|d| d.matches(record.record()))
                    .map(|d| d.delta(self.options.nudge_delta))
                    .sum();
                if delta == 0.0 {
                    (*record).clone()
                } else {
                    record.nudged(delta)
                }
            })
            .collect();

        let scores: Vec<f32> = nudged.iter().map(|r| r.buyability_score()).collect();
        rank_order(&scores)
            .into_iter()
            .take(top_n)
            .map(|i| nudged[i].clone())
            .collect()
    }

    fn filter(&self, pool: &[&ScoreRecord], directives: &[Directive], top_n: usize) -> (Vec<ScoreRecord>, usize) {
        let scores: Vec<f32> = pool.iter().map(|r| r.buyability_score()).collect();
        let ranked: Vec<&ScoreRecord> = rank_order(&scores).into_iter().map(|i| pool[i]).collect();

        if directives.is_empty() {
            return (ranked.into_iter().take(top_n).cloned().collect(), 0);
        }

        let (matching, rest): (Vec<&ScoreRecord>, Vec<&ScoreRecord>) =
            ranked.into_iter().partition(|r| Self::satisfies(r, directives));

        let mut items: Vec<ScoreRecord> = matching.into_iter().take(top_n).cloned().collect();
        let kept = items.len();
        items.extend(rest.into_iter().take(top_n - kept).cloned());
        let backfilled = items.len() - kept;
        (items, backfilled)
    }

    // Hits at least one boost (when there are any) and no suppress
    fn satisfies(record: &ScoreRecord, directives: &[Directive]) -> bool {
        let mut boosts = directives.iter().filter(|d| d.polarity == Polarity::Boost).peekable();
        let boosted = boosts.peek().is_none() || boosts.any(|d| d.matches(record.record()));
        let suppressed = directives
            .iter()
            .filter(|d| d.polarity == Polarity::Suppress)
            .any(|d| d.matches(record.record()));
        boosted && !suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentScores;
    use pickwise_core::{ProductRecord, Source};

    fn schema() -> AttributeSchema {
        AttributeSchema::new(["color", "print"]).unwrap()
    }

    fn scored(id: &str, color: &str, score: f32) -> ScoreRecord {
        ScoreRecord::new(
            ProductRecord::new(id, Source::Candidate).with_attribute("color", color),
            ComponentScores::default(),
            ComponentScores::default(),
            score,
        )
    }

    fn ids(list: &RecommendedList) -> Vec<String> {
        list.items.iter().map(|r| r.id().to_string()).collect()
    }

    fn batch() -> Vec<ScoreRecord> {
        vec![
            scored("a", "black", 0.9),
            scored("b", "red", 0.5),
            scored("c", "blue", 0.7),
            scored("d", "red", 0.65),
            scored("e", "black", 0.3),
        ]
    }

    #[test]
    fn test_top_n_ordering() {
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        let list = recommender.recommend(&batch(), 3, None);
        assert_eq!(ids(&list), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_top_n_larger_than_pool() {
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        assert_eq!(recommender.recommend(&batch(), 20, None).len(), 5);
        assert!(recommender.recommend(&[], 5, None).is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let mut records = batch();
        records.push(scored("a", "black", 0.95));
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        let list = recommender.recommend(&records, 10, None);
        assert_eq!(list.len(), 5);
        assert_eq!(list.items[0].buyability_score(), 0.9);
    }

    #[test]
    fn test_nudge_reorders() {
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        let list = recommender.recommend(&batch(), 5, Some("more red"));

        assert_eq!(ids(&list), vec!["a", "d", "c", "b", "e"]);
        assert!((list.items[1].buyability_score() - 0.75).abs() < 1e-6);
        assert_eq!(list.directives.len(), 1);
    }

    #[test]
    fn test_suppress_nudge() {
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        let list = recommender.recommend(&batch(), 2, Some("fewer black"));
        assert_eq!(ids(&list), vec!["a", "c"]);
        assert!((list.items[0].buyability_score() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_filter_mode_backfills() {
        let options = RefinementOptions {
            mode: RefinementMode::Filter,
            ..RefinementOptions::default()
        };
        let recommender = Recommender::new(schema(), options);
        let list = recommender.recommend(&batch(), 4, Some("more red"));

        assert_eq!(ids(&list), vec!["d", "b", "a", "c"]);
        assert_eq!(list.backfilled, 2);
    }

    #[test]
    fn test_filter_mode_without_directives() {
        let options = RefinementOptions {
            mode: RefinementMode::Filter,
            ..RefinementOptions::default()
        };
        let recommender = Recommender::new(schema(), options);
        let list = recommender.recommend(&batch(), 2, Some("something nice"));
        assert_eq!(ids(&list), vec!["a", "c"]);
        assert_eq!(list.backfilled, 0);
    }

    #[test]
    fn test_price_range() {
        let records: Vec<ScoreRecord> = vec![
            ScoreRecord::new(
                ProductRecord::new("cheap", Source::Candidate).with_price(20.0),
                ComponentScores::default(),
                ComponentScores::default(),
                0.4,
            ),
            ScoreRecord::new(
                ProductRecord::new("dear", Source::Candidate).with_price(200.0),
                ComponentScores::default(),
                ComponentScores::default(),
                0.9,
            ),
            ScoreRecord::new(
                ProductRecord::new("unpriced", Source::Candidate),
                ComponentScores::default(),
                ComponentScores::default(),
                0.8,
            ),
        ];
        let recommender = Recommender::new(schema(), RefinementOptions::default());
        let request = RecommendRequest::new(5).with_price(PriceRange::new(None, Some(100.0)));
        let list = recommender.recommend_with(&records, &request);
        assert_eq!(ids(&list), vec!["cheap"]);

        assert!(PriceRange::default().contains(None));
        assert!(PriceRange::new(Some(10.0), Some(20.0)).contains(Some(20.0)));
    }

    #[test]
    fn test_refinement_options_serde() {
        let options: RefinementOptions = serde_json::from_str(r#"{"mode": "filter"}"#).unwrap();
        assert_eq!(options.mode, RefinementMode::Filter);
        assert_eq!(options.nudge_delta, DEFAULT_NUDGE_DELTA);
    }
}
