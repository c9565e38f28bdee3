//! # Fuzzy Food Matcher
//!
//! Scores and ranks composition records against a free-text ingredient name.
//!
//! ## Scoring
//!
//! Both sides are compared in normalized form (lowercase, no diacritics,
//! punctuation-trimmed tokens). Points are additive:
//!
//! | Rule | Points |
//! |---|---|
//! | description equals query | +100 |
//! | description starts with query | +50 |
//! | first description token starts with first query token | +20 |
//! | per query token: exact description token | +10 |
//! | per query token: otherwise prefix of a description token | +5 |
//! | per query token: otherwise substring of the description | +2 |
//!
//! Records scoring zero are excluded. Ties keep table order.

use log::{debug, trace};
use serde::Serialize;

use crate::composition::{CompositionRecord, CompositionTable};
use crate::config::MatcherConfig;
use crate::text_normalizer::normalize;

const EXACT_MATCH_POINTS: u32 = 100;
const PREFIX_MATCH_POINTS: u32 = 50;
const FIRST_TOKEN_POINTS: u32 = 20;
const TOKEN_EXACT_POINTS: u32 = 10;
const TOKEN_PREFIX_POINTS: u32 = 5;
const TOKEN_SUBSTRING_POINTS: u32 = 2;

/// A record together with its match score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord<'a> {
    pub record: &'a CompositionRecord,
    pub score: u32,
}

/// Pre-normalized query, computed once per ranking
#[derive(Debug)]
struct Query {
    text: String,
    tokens: Vec<String>,
}

impl Query {
    fn new(raw: &str) -> Self {
        let tokens = normalize(raw);
        Self {
            text: tokens.join(" "),
            tokens,
        }
    }
}

fn score_normalized(query: &Query, description: &str) -> u32 {
    let desc_tokens = normalize(description);
    let desc_text = desc_tokens.join(" ");
    let mut score = 0;

    if desc_text == query.text {
        score += EXACT_MATCH_POINTS;
    }
    if desc_text.starts_with(&query.text) {
        score += PREFIX_MATCH_POINTS;
    }
    if let (Some(desc_first), Some(query_first)) = (desc_tokens.first(), query.tokens.first()) {
        if desc_first.starts_with(query_first.as_str()) {
            score += FIRST_TOKEN_POINTS;
        }
    }

    for token in &query.tokens {
        if desc_tokens.iter().any(|t| t == token) {
            score += TOKEN_EXACT_POINTS;
        } else if desc_tokens.iter().any(|t| t.starts_with(token.as_str())) {
            score += TOKEN_PREFIX_POINTS;
        } else if desc_text.contains(token.as_str()) {
            score += TOKEN_SUBSTRING_POINTS;
        }
    }

    score
}

/// Score one description against a query
///
/// Returns zero when the query has no usable tokens.
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::matcher::score;
///
/// // prefix + first token + token exact
/// assert_eq!(score("arroz", "Arroz, tipo 1, cozido"), 80);
/// assert_eq!(score("Feijão", "feijao"), 180);
/// assert_eq!(score("quinoa", "Arroz, tipo 1, cozido"), 0);
/// ```
pub fn score(query: &str, description: &str) -> u32 {
    let query = Query::new(query);
    if query.tokens.is_empty() {
        return 0;
    }
    score_normalized(&query, description)
}

/// Rank table records against an ingredient name
///
/// Returns at most `config.max_results` records with a positive score, best
/// first. Queries shorter than `config.min_query_chars` after normalization
/// yield an empty list.
pub fn rank<'a>(
    table: &'a CompositionTable,
    query: &str,
    config: &MatcherConfig,
) -> Vec<ScoredRecord<'a>> {
    let normalized = Query::new(query);
    if normalized.tokens.is_empty() || normalized.text.chars().count() < config.min_query_chars {
        trace!("Query '{}' too short to rank", query);
        return Vec::new();
    }

    let mut scored: Vec<ScoredRecord<'a>> = table
        .records()
        .iter()
        .filter_map(|record| {
            let score = score_normalized(&normalized, &record.description);
            (score > 0).then_some(ScoredRecord { record, score })
        })
        .collect();

    // Stable sort keeps table order among equal scores
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(config.max_results);

    debug!(
        "Ranked '{}' against {} records: {} candidates",
        query,
        table.len(),
        scored.len()
    );
    scored
}

/// Ranking front-end holding the matcher limits
#[derive(Debug, Clone, Default)]
pub struct FoodMatcher {
    config: MatcherConfig,
}

impl FoodMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Ranked records with their scores
    pub fn rank<'a>(&self, table: &'a CompositionTable, name: &str) -> Vec<ScoredRecord<'a>> {
        rank(table, name, &self.config)
    }

    /// Ranked records, best first
    pub fn matches(&self, table: &CompositionTable, name: &str) -> Vec<CompositionRecord> {
        self.rank(table, name)
            .into_iter()
            .map(|scored| scored.record.clone())
            .collect()
    }

    /// The record used for auto-resolution, if any clears the acceptance score
    pub fn best_match<'a>(
        &self,
        table: &'a CompositionTable,
        name: &str,
    ) -> Option<ScoredRecord<'a>> {
        self.rank(table, name)
            .into_iter()
            .next()
            .filter(|best| best.score >= self.config.min_accept_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(descriptions: &[&str]) -> CompositionTable {
        let records = descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| CompositionRecord {
                id: i as u32 + 1,
                description: d.to_string(),
                category: String::new(),
                base_quantity: 100.0,
                base_unit: Default::default(),
                attributes: Default::default(),
            })
            .collect();
        CompositionTable::new(records)
    }

    #[test]
    fn test_score_components() {
        // exact + prefix + first token + token exact
        assert_eq!(score("banana", "Banana"), 180);
        // token prefix only
        assert_eq!(score("ban", "Doce de banana"), 5);
        // substring only
        assert_eq!(score("nan", "Banana, prata"), 2);
        // first token prefix + token prefix + token exact
        assert_eq!(score("feij preto", "Feijão, preto, cozido"), 35);
    }

    #[test]
    fn test_accents_and_case_are_ignored() {
        assert_eq!(score("FEIJAO", "Feijão, carioca, cozido"), score("feijão", "feijao carioca cozido"));
    }

    #[test]
    fn test_rank_orders_by_score_then_table_order() {
        let t = table(&[
            "Arroz, integral, cozido",
            "Biscoito de arroz",
            "Arroz, tipo 2, cozido",
            "Arroz",
        ]);
        let config = MatcherConfig::default();
        let ranked: Vec<u32> = rank(&t, "arroz", &config).iter().map(|s| s.record.id).collect();
        assert_eq!(ranked, vec![4, 1, 3, 2]);
    }

    #[test]
    fn test_zero_scores_excluded_and_truncated() {
        let t = table(&["Leite", "Leite de cabra", "Leite condensado", "Pão"]);
        let config = MatcherConfig {
            max_results: 2,
            ..Default::default()
        };
        let ranked = rank(&t, "leite", &config);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|s| s.record.description.starts_with("Leite")));
    }

    #[test]
    fn test_short_query_returns_nothing() {
        let t = table(&["Ovo, de galinha"]);
        let config = MatcherConfig::default();
        assert!(rank(&t, "o", &config).is_empty());
        assert!(rank(&t, "  ,. ", &config).is_empty());
    }

    #[test]
    fn test_best_match_threshold() {
        let t = table(&["Banana, prata, crua"]);
        let matcher = FoodMatcher::new(MatcherConfig {
            min_accept_score: 50,
            ..Default::default()
        });
        assert!(matcher.best_match(&t, "banana").is_some());
        assert!(matcher.best_match(&t, "prata").is_none());
        assert!(matcher.best_match(&t, "quinoa").is_none());
    }
}
