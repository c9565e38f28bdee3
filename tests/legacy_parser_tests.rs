//! # Legacy Parser Tests
//!
//! Offline parsing of `name: quantity unit` meal descriptions.

#[cfg(test)]
mod tests {
    use nutrition_engine::ingredient_model::{ParsedIngredient, Unit};
    use nutrition_engine::legacy_parser::{parse_meal_text, GENERIC_PORTION_NAME};

    /// Two named ingredients in grams
    #[test]
    fn test_rice_and_beans() {
        let parsed = parse_meal_text("Arroz: 100g, Feijão: 50g");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], ParsedIngredient::new("Arroz", 100.0, Unit::Grams).unwrap());
        assert_eq!(parsed[1], ParsedIngredient::new("Feijão", 50.0, Unit::Grams).unwrap());
    }

    /// A quantity without a name becomes a generic portion
    #[test]
    fn test_nameless_quantity() {
        let parsed = parse_meal_text("200ml");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, GENERIC_PORTION_NAME);
        assert_eq!(parsed[0].quantity, 200.0);
        assert_eq!(parsed[0].unit, Unit::Milliliters);
    }

    /// Input shorter than three characters yields nothing
    #[test]
    fn test_too_short() {
        assert!(parse_meal_text("oi").is_empty());
        assert!(parse_meal_text(" a ").is_empty());
    }

    /// A realistic daycare lunch with mixed units and noise
    #[test]
    fn test_daycare_lunch() {
        let text = "Arroz: 60g, Feijão carioca: 50 g, Frango grelhado: 50g, \
                    Cenoura cozida: 40g, Suco de laranja: 100 ml, sobremesa, Ovo: 1 un";
        let parsed = parse_meal_text(text);

        let names: Vec<&str> = parsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Arroz",
                "Feijão carioca",
                "Frango grelhado",
                "Cenoura cozida",
                "Suco de laranja",
                "Ovo"
            ]
        );
        assert_eq!(parsed[4].unit, Unit::Milliliters);
        assert_eq!(parsed[5].unit, Unit::Units);
    }

    /// Zero quantities are dropped silently
    #[test]
    fn test_zero_quantity_dropped() {
        let parsed = parse_meal_text("Arroz: 0g, Feijão: 50g, 0ml");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Feijão");
    }
}
