//! # Legacy Pattern Parser
//!
//! Deterministic, offline extraction of ingredients from strings such as
//! `"Arroz: 100g, Feijão: 50g, 200ml"`. Used when the AI extraction step is
//! disabled or unavailable.
//!
//! ## Rules
//!
//! - Input shorter than 3 characters (after trimming) yields nothing
//! - The input is split on commas; each segment is parsed on its own
//! - `name: quantity unit?` is tried first (unit defaults to grams)
//! - A bare `quantity unit?` gets the generic name "Porção"
//! - Segments matching neither form are dropped silently
//!
//! ## Usage
//!
//! ```rust
//! use nutrition_engine::legacy_parser::parse_meal_text;
//! use nutrition_engine::ingredient_model::Unit;
//!
//! let parsed = parse_meal_text("Arroz: 100g, Feijão: 50g");
//! assert_eq!(parsed.len(), 2);
//! assert_eq!(parsed[1].name, "Feijão");
//! assert_eq!(parsed[1].quantity, 50.0);
//! assert_eq!(parsed[1].unit, Unit::Grams);
//! ```

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use std::fmt;

use crate::config::MIN_INPUT_CHARS;
use crate::ingredient_model::{IngredientError, ParsedIngredient, Unit};

/// Name given to quantities written without an ingredient name
pub const GENERIC_PORTION_NAME: &str = "Porção";

lazy_static! {
    /// `Arroz: 100g`, `Leite: 150 ml`, `Banana: 1 un`
    static ref NAMED_QUANTITY: Regex =
        Regex::new(r"^(?P<name>[^:]+?)\s*:\s*(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>\p{L}+)?\.?$")
            .expect("Named quantity pattern should be valid");
    /// `200ml`, `50 g`, `2`
    static ref BARE_QUANTITY: Regex =
        Regex::new(r"^(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>\p{L}+)?\.?$")
            .expect("Bare quantity pattern should be valid");
}

/// Reasons a segment is dropped
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The segment matches neither pattern
    NoMatch,
    /// The unit is not one of g, ml, un (or kg, l)
    UnknownUnit(String),
    /// The quantity could not be read as a number
    InvalidNumber(String),
    /// The values do not form a valid ingredient (e.g. zero quantity)
    InvalidIngredient(IngredientError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoMatch => write!(f, "Segment does not match any pattern"),
            ParseError::UnknownUnit(unit) => write!(f, "Unknown unit: {unit}"),
            ParseError::InvalidNumber(raw) => write!(f, "Invalid number format: {raw}"),
            ParseError::InvalidIngredient(err) => write!(f, "Invalid ingredient: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<IngredientError> for ParseError {
    fn from(err: IngredientError) -> Self {
        ParseError::InvalidIngredient(err)
    }
}

/// Parse a whole meal text into ingredients
///
/// Pure function: identical input always gives identical output.
pub fn parse_meal_text(text: &str) -> Vec<ParsedIngredient> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_INPUT_CHARS {
        trace!("Input too short for legacy parsing: '{}'", trimmed);
        return Vec::new();
    }

    let ingredients: Vec<ParsedIngredient> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match parse_segment(segment) {
            Ok(ingredient) => Some(ingredient),
            Err(e) => {
                trace!("Dropping segment '{}': {}", segment, e);
                None
            }
        })
        .collect();

    debug!(
        "Legacy parser extracted {} ingredients from '{}'",
        ingredients.len(),
        trimmed
    );
    ingredients
}

/// Parse one comma-separated segment
pub fn parse_segment(segment: &str) -> Result<ParsedIngredient, ParseError> {
    let segment = segment.trim();

    if let Some(captures) = NAMED_QUANTITY.captures(segment) {
        let name = captures.name("name").map(|m| m.as_str()).unwrap_or("");
        let qty = captures.name("qty").map(|m| m.as_str()).unwrap_or("");
        let unit = captures.name("unit").map(|m| m.as_str()).unwrap_or("");
        return build_ingredient(name, qty, unit);
    }

    if let Some(captures) = BARE_QUANTITY.captures(segment) {
        let qty = captures.name("qty").map(|m| m.as_str()).unwrap_or("");
        let unit = captures.name("unit").map(|m| m.as_str()).unwrap_or("");
        return build_ingredient(GENERIC_PORTION_NAME, qty, unit);
    }

    Err(ParseError::NoMatch)
}

fn build_ingredient(name: &str, qty: &str, unit: &str) -> Result<ParsedIngredient, ParseError> {
    let amount: f64 = qty
        .parse()
        .map_err(|_| ParseError::InvalidNumber(qty.to_string()))?;
    let (unit, multiplier) =
        Unit::parse(unit).ok_or_else(|| ParseError::UnknownUnit(unit.to_string()))?;

    Ok(ParsedIngredient::new(name, amount * multiplier, unit)?)
}
