//! Fail-closed parsing of extraction service output.
//!
//! Accepted shapes, tried in order:
//!
//! 1. the whole body as `{"foods": [...]}` or a bare `[...]`
//! 2. the first balanced `[...]` found anywhere in the text (models like to
//!    wrap JSON in prose or code fences)
//!
//! Anything else yields an empty list. Each item is validated on its own;
//! an invalid item is dropped without discarding its siblings.

use log::{trace, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::ingredient_model::{ParsedIngredient, Unit};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FoodsPayload {
    List(Vec<Value>),
    Envelope { foods: Vec<Value> },
}

impl FoodsPayload {
    fn into_items(self) -> Vec<Value> {
        match self {
            FoodsPayload::List(items) | FoodsPayload::Envelope { foods: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FoodItem {
    name: String,
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Extract the message of an `{"error": "..."}` body
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body.trim())
        .ok()
        .map(|e| e.error)
}

/// Parse extraction output into validated ingredients
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::extraction::response::parse_foods;
///
/// let content = "Claro! ```json\n[{\"name\": \"Arroz\", \"quantity\": 60, \"unit\": \"g\"}]\n```";
/// let foods = parse_foods(content);
/// assert_eq!(foods.len(), 1);
/// assert_eq!(foods[0].name, "Arroz");
///
/// assert!(parse_foods("desculpe, não entendi").is_empty());
/// ```
pub fn parse_foods(content: &str) -> Vec<ParsedIngredient> {
    let trimmed = content.trim();

    let items = match serde_json::from_str::<FoodsPayload>(trimmed) {
        Ok(payload) => payload.into_items(),
        Err(strict_err) => {
            trace!("Strict parse failed: {}", strict_err);
            let embedded = find_json_array(trimmed)
                .and_then(|slice| serde_json::from_str::<Vec<Value>>(slice).ok());
            match embedded {
                Some(items) => items,
                None => {
                    warn!("Unparseable extraction response: {}", trimmed);
                    return Vec::new();
                }
            }
        }
    };

    items.into_iter().filter_map(validate_item).collect()
}

fn validate_item(item: Value) -> Option<ParsedIngredient> {
    let food: FoodItem = match serde_json::from_value(item) {
        Ok(food) => food,
        Err(e) => {
            trace!("Dropping malformed food item: {}", e);
            return None;
        }
    };

    let unit_label = food.unit.as_deref().unwrap_or("");
    let Some((unit, multiplier)) = Unit::parse(unit_label) else {
        trace!("Dropping '{}' with unknown unit '{}'", food.name, unit_label);
        return None;
    };

    match ParsedIngredient::new(&food.name, food.quantity * multiplier, unit) {
        Ok(ingredient) => Some(ingredient),
        Err(e) => {
            trace!("Dropping food item '{}': {}", food.name, e);
            None
        }
    }
}

/// Locate the first balanced JSON array in `text`
///
/// Brackets inside string literals (including escaped quotes) are ignored.
/// Returns `None` when the first `[` is never closed.
pub fn find_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_and_bare_list() {
        let envelope = r#"{"foods": [{"name": "Feijão", "quantity": 50, "unit": "g"}]}"#;
        assert_eq!(parse_foods(envelope)[0].name, "Feijão");

        let bare = r#"[{"name": "Leite", "quantity": 150, "unit": "ml"}]"#;
        assert_eq!(parse_foods(bare)[0].unit, Unit::Milliliters);
    }

    #[test]
    fn test_missing_unit_defaults_to_grams() {
        let foods = parse_foods(r#"[{"name": "Banana", "quantity": 80}]"#);
        assert_eq!(foods[0].unit, Unit::Grams);
        assert_eq!(foods[0].quantity, 80.0);
    }

    #[test]
    fn test_invalid_items_are_dropped_individually() {
        let content = r#"[
            {"name": "Arroz", "quantity": 60, "unit": "g"},
            {"name": "", "quantity": 10, "unit": "g"},
            {"name": "Sal", "quantity": 0, "unit": "g"},
            {"name": "Azeite", "quantity": 1, "unit": "colher"},
            {"name": "Cenoura", "quantity": "quarenta", "unit": "g"},
            {"nome": "Tomate"},
            "Chuchu",
            {"name": "Suco", "quantity": 0.5, "unit": "l"}
        ]"#;

        let foods = parse_foods(content);
        let names: Vec<&str> = foods.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Arroz", "Suco"]);
        assert_eq!(foods[1].quantity, 500.0);
    }

    #[test]
    fn test_embedded_array_is_recovered() {
        let content = "Aqui está:\n```json\n[{\"name\": \"Pão [francês]\", \"quantity\": 25, \"unit\": \"g\"}]\n```\nBom apetite!";
        let foods = parse_foods(content);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "Pão [francês]");
    }

    #[test]
    fn test_unparseable_content_yields_empty() {
        assert!(parse_foods("").is_empty());
        assert!(parse_foods("sem JSON aqui").is_empty());
        assert!(parse_foods("[{\"name\": \"Arroz\"").is_empty());
        assert!(parse_foods(r#"{"foods": "nenhum"}"#).is_empty());
    }

    #[test]
    fn test_find_json_array() {
        assert_eq!(find_json_array("x [1, [2]] y [3]"), Some("[1, [2]]"));
        assert_eq!(
            find_json_array(r#"pre ["a]\"b", "c"] post"#),
            Some(r#"["a]\"b", "c"]"#)
        );
        assert_eq!(find_json_array("[1, 2"), None);
        assert_eq!(find_json_array("nada"), None);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error": "Rate limit"}"#),
            Some("Rate limit".to_string())
        );
        assert_eq!(error_message("plain text"), None);
    }
}
