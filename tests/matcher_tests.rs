//! # Matcher Tests
//!
//! Ranking against the bundled TACO sample.

#[cfg(test)]
mod tests {
    use nutrition_engine::composition::CompositionTable;
    use nutrition_engine::config::MatcherConfig;
    use nutrition_engine::matcher::{rank, FoodMatcher};

    fn table() -> CompositionTable {
        CompositionTable::bundled().unwrap()
    }

    /// Equal scores keep table order, run after run
    #[test]
    fn test_ranking_is_deterministic() {
        let table = table();
        let matcher = FoodMatcher::default();

        let first: Vec<String> = matcher
            .matches(&table, "arroz")
            .into_iter()
            .map(|r| r.description)
            .collect();
        let second: Vec<String> = matcher
            .matches(&table, "arroz")
            .into_iter()
            .map(|r| r.description)
            .collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "Arroz, integral, cozido",
                "Arroz, tipo 1, cozido",
                "Arroz, tipo 2, cozido"
            ]
        );
    }

    /// Extra query tokens pick the more specific record
    #[test]
    fn test_specific_query_wins() {
        let table = table();
        let config = MatcherConfig::default();

        let ranked = rank(&table, "feijão preto", &config);
        assert_eq!(ranked[0].record.description, "Feijão, preto, cozido");
        assert!(ranked[0].score > ranked[1].score);

        let ranked = rank(&table, "suco de laranja", &config);
        assert_eq!(ranked[0].record.description, "Laranja, pêra, suco");
    }

    /// Accents and case do not matter
    #[test]
    fn test_accent_insensitive() {
        let table = table();
        let matcher = FoodMatcher::default();

        let plain = matcher.best_match(&table, "MACA").unwrap();
        assert_eq!(plain.record.description, "Maçã, Fuji, com casca, crua");

        let accented = matcher.best_match(&table, "maçã").unwrap();
        assert_eq!(plain, accented);
    }

    /// Unknown foods rank nothing
    #[test]
    fn test_quinoa_not_in_table() {
        let table = table();
        let matcher = FoodMatcher::default();

        assert!(matcher.matches(&table, "quinoa").is_empty());
        assert!(matcher.best_match(&table, "quinoa").is_none());
    }

    /// Result size follows the configured limit
    #[test]
    fn test_max_results() {
        let table = table();
        let config = MatcherConfig {
            max_results: 2,
            ..Default::default()
        };

        // "cozido" appears in many records
        let ranked = rank(&table, "cozido", &config);
        assert_eq!(ranked.len(), 2);
    }
}
