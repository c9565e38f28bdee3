//! # Text Normalizer Module
//!
//! Shared text normalization for food matching and legacy parsing.
//!
//! ## Steps
//!
//! - Lowercase
//! - NFD decomposition followed by removal of combining marks ("feijão" -> "feijao")
//! - Split on whitespace and commas
//! - Trim punctuation around each token ("(cru)" -> "cru")
//! - Drop tokens of a single character

use log::trace;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Minimum token length kept by [`normalize`]
pub const MIN_TOKEN_CHARS: usize = 2;

/// Lowercase a string and strip its diacritics
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::text_normalizer::fold_diacritics;
///
/// assert_eq!(fold_diacritics("Feijão Preto"), "feijao preto");
/// assert_eq!(fold_diacritics("Maçã"), "maca");
/// ```
pub fn fold_diacritics(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Normalize text into comparable tokens
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::text_normalizer::normalize;
///
/// let tokens = normalize("Arroz, tipo 1, cozido");
/// assert_eq!(tokens, vec!["arroz", "tipo", "cozido"]);
/// ```
pub fn normalize(text: &str) -> Vec<String> {
    let folded = fold_diacritics(text);
    let tokens: Vec<String> = folded
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect();

    trace!("Normalized '{}' -> {:?}", text, tokens);
    tokens
}

/// Normalize text into a single canonical string (tokens joined by one space)
///
/// This is the form compared by the food matcher for exact and prefix checks.
pub fn normalize_text(text: &str) -> String {
    normalize(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_diacritics() {
        assert_eq!(normalize("FEIJÃO"), vec!["feijao"]);
        assert_eq!(normalize("Pão francês"), vec!["pao", "frances"]);
        assert_eq!(normalize("Açúcar refinado"), vec!["acucar", "refinado"]);
    }

    #[test]
    fn test_splits_on_commas_and_whitespace() {
        assert_eq!(
            normalize("Carne, bovina,patinho  sem\tgordura"),
            vec!["carne", "bovina", "patinho", "sem", "gordura"]
        );
    }

    #[test]
    fn test_drops_short_tokens() {
        assert_eq!(normalize("Arroz, tipo 1, cozido"), vec!["arroz", "tipo", "cozido"]);
        assert_eq!(normalize("a e o"), Vec::<String>::new());
    }

    #[test]
    fn test_trims_punctuation() {
        assert_eq!(
            normalize("Maçã, Fuji, (com casca), crua."),
            vec!["maca", "fuji", "com", "casca", "crua"]
        );
    }

    #[test]
    fn test_normalize_text_joins_tokens() {
        assert_eq!(normalize_text("  Frango,   peito "), "frango peito");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_is_deterministic() {
        let input = "Batata, inglesa, cozida";
        assert_eq!(normalize(input), normalize(input));
    }
}
