//! # Ingredient and Meal Data Model
//!
//! This module defines the data structures that flow through a resolution:
//!
//! - **ParsedIngredient**: a food name with a positive quantity and unit, as
//!   extracted from free text
//! - **ResolvedIngredient**: a parsed ingredient matched against the
//!   composition table (or tagged "not found")
//! - **MealNutritionResult**: the resolved ingredients of one meal plus the
//!   summed nutrient totals
//!
//! ## Usage
//!
//! ```rust
//! use nutrition_engine::ingredient_model::{ParsedIngredient, Unit};
//!
//! let rice = ParsedIngredient::new("Arroz", 60.0, Unit::Grams)?;
//! assert_eq!(rice.to_string(), "Arroz: 60g");
//!
//! assert!(ParsedIngredient::new("Arroz", 0.0, Unit::Grams).is_err());
//! # Ok::<(), nutrition_engine::ingredient_model::IngredientError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::composition::CompositionRecord;
use crate::nutrients::NutritionTotals;
use crate::text_normalizer::fold_diacritics;

/// Category assigned to ingredients with no acceptable table match
pub const NOT_FOUND_CATEGORY: &str = "Não encontrado";

/// Measurement units accepted for ingredient quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Grams
    #[default]
    #[serde(rename = "g")]
    Grams,
    /// Milliliters
    #[serde(rename = "ml")]
    Milliliters,
    /// Individual units/pieces
    #[serde(rename = "un")]
    Units,
}

impl Unit {
    /// Short label used in text and JSON
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Milliliters => "ml",
            Unit::Units => "un",
        }
    }

    /// Parse a unit spelling into a unit and a multiplier to that unit
    ///
    /// `kg` and `l` are folded into grams and milliliters. Labels are
    /// compared without case or diacritics.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nutrition_engine::ingredient_model::Unit;
    ///
    /// assert_eq!(Unit::parse("ML"), Some((Unit::Milliliters, 1.0)));
    /// assert_eq!(Unit::parse("kg"), Some((Unit::Grams, 1000.0)));
    /// assert_eq!(Unit::parse("Porção"), Some((Unit::Units, 1.0)));
    /// assert_eq!(Unit::parse("xícara"), None);
    /// ```
    pub fn parse(label: &str) -> Option<(Unit, f64)> {
        let label = fold_diacritics(label.trim());
        let parsed = match label.as_str() {
            "" | "g" | "gr" | "grama" | "gramas" => (Unit::Grams, 1.0),
            "kg" | "quilo" | "quilos" => (Unit::Grams, 1000.0),
            "ml" | "mililitro" | "mililitros" => (Unit::Milliliters, 1.0),
            "l" | "litro" | "litros" => (Unit::Milliliters, 1000.0),
            "un" | "und" | "unid" | "unidade" | "unidades" | "porcao" | "porcoes" => {
                (Unit::Units, 1.0)
            }
            _ => return None,
        };
        Some(parsed)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Reasons an ingredient cannot be constructed
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientError {
    /// Name is empty after trimming
    EmptyName,
    /// Quantity is zero, negative, or not a finite number
    InvalidQuantity(f64),
}

impl fmt::Display for IngredientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngredientError::EmptyName => write!(f, "Ingredient name is empty"),
            IngredientError::InvalidQuantity(q) => {
                write!(f, "Ingredient quantity must be positive, got {q}")
            }
        }
    }
}

impl std::error::Error for IngredientError {}

/// An ingredient extracted from a meal description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedIngredient {
    /// Free-text name as extracted (e.g. "Arroz", "frango grelhado")
    pub name: String,
    /// Quantity, always finite and strictly positive
    pub quantity: f64,
    /// Unit of `quantity`
    pub unit: Unit,
}

impl ParsedIngredient {
    /// Create a validated ingredient
    ///
    /// The name is trimmed; empty names and non-positive or non-finite
    /// quantities are rejected.
    pub fn new(name: &str, quantity: f64, unit: Unit) -> Result<Self, IngredientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IngredientError::EmptyName);
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(IngredientError::InvalidQuantity(quantity));
        }
        Ok(Self {
            name: name.to_string(),
            quantity,
            unit,
        })
    }
}

impl fmt::Display for ParsedIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity.fract() == 0.0 {
            write!(f, "{}: {}{}", self.name, self.quantity as i64, self.unit)
        } else {
            write!(f, "{}: {}{}", self.name, self.quantity, self.unit)
        }
    }
}

/// A parsed ingredient after matching against the composition table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIngredient {
    /// The ingredient as extracted
    #[serde(flatten)]
    pub parsed: ParsedIngredient,
    /// Matched record id, `None` when not found
    pub record_id: Option<u32>,
    /// Matched record description, or the extracted name when not found
    pub description: String,
    /// Matched record category, or [`NOT_FOUND_CATEGORY`]
    pub category: String,
    /// Match score of the chosen record (0 when not found)
    pub score: u32,
    /// Nutrients scaled to `parsed.quantity`, `None` when not found
    pub nutrients: Option<NutritionTotals>,
}

impl ResolvedIngredient {
    /// Build a resolved ingredient from a matched record and its scaled nutrients
    pub fn matched(
        parsed: ParsedIngredient,
        record: &CompositionRecord,
        score: u32,
        nutrients: NutritionTotals,
    ) -> Self {
        Self {
            parsed,
            record_id: Some(record.id),
            description: record.description.clone(),
            category: record.category.clone(),
            score,
            nutrients: Some(nutrients),
        }
    }

    /// Build the "not found" sentinel for an ingredient
    pub fn not_found(parsed: ParsedIngredient) -> Self {
        let description = parsed.name.clone();
        Self {
            parsed,
            record_id: None,
            description,
            category: NOT_FOUND_CATEGORY.to_string(),
            score: 0,
            nutrients: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Which path produced the ingredient list of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// The natural-language extraction service
    Ai,
    /// The offline pattern parser
    Legacy,
    /// Nothing was extracted (input too short)
    None,
}

/// Notices worth showing to the end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// The composition table could not be loaded; totals are missing
    TableUnavailable { cause: String },
    /// The extraction service refused the call for lack of credits
    ExtractionQuotaExhausted { message: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::TableUnavailable { cause } => {
                write!(f, "Composition table unavailable: {cause}")
            }
            ResolutionWarning::ExtractionQuotaExhausted { message } => {
                write!(f, "Extraction quota exhausted: {message}")
            }
        }
    }
}

/// Nutrition breakdown of a single meal description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealNutritionResult {
    /// Every extracted ingredient, including the ones not found
    pub foods: Vec<ResolvedIngredient>,
    /// Sum over found ingredients, `None` when nothing contributed
    pub totals: Option<NutritionTotals>,
    pub source: ExtractionSource,
    pub warnings: Vec<ResolutionWarning>,
    pub resolved_at: DateTime<Utc>,
}

impl MealNutritionResult {
    /// A result with no foods and no data
    pub fn empty() -> Self {
        Self {
            foods: Vec::new(),
            totals: None,
            source: ExtractionSource::None,
            warnings: Vec::new(),
            resolved_at: Utc::now(),
        }
    }

    /// Number of ingredients that matched a record
    pub fn found_count(&self) -> usize {
        self.foods.iter().filter(|f| f.is_found()).count()
    }

    /// Ingredients tagged "not found"
    pub fn not_found(&self) -> impl Iterator<Item = &ResolvedIngredient> {
        self.foods.iter().filter(|f| !f.is_found())
    }

    /// Whether the result is missing data because of a degraded dependency
    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ResolutionWarning::TableUnavailable { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_ingredient_validation() {
        let rice = ParsedIngredient::new("  Arroz ", 100.0, Unit::Grams).unwrap();
        assert_eq!(rice.name, "Arroz");

        assert_eq!(
            ParsedIngredient::new("   ", 10.0, Unit::Grams),
            Err(IngredientError::EmptyName)
        );
        assert!(ParsedIngredient::new("Leite", -5.0, Unit::Milliliters).is_err());
        assert!(ParsedIngredient::new("Leite", f64::INFINITY, Unit::Milliliters).is_err());
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(Unit::parse(""), Some((Unit::Grams, 1.0)));
        assert_eq!(Unit::parse("G"), Some((Unit::Grams, 1.0)));
        assert_eq!(Unit::parse("unidades"), Some((Unit::Units, 1.0)));
        assert_eq!(Unit::parse("L"), Some((Unit::Milliliters, 1000.0)));
        assert_eq!(Unit::parse("colher"), None);
    }

    #[test]
    fn test_unit_parsing_ignores_diacritics() {
        assert_eq!(Unit::parse("Porção"), Some((Unit::Units, 1.0)));
        assert_eq!(Unit::parse("porções"), Some((Unit::Units, 1.0)));
        assert_eq!(Unit::parse("Mililítros"), Some((Unit::Milliliters, 1.0)));
        assert_eq!(Unit::parse("GRAMAS"), Some((Unit::Grams, 1.0)));
    }

    #[test]
    fn test_unit_serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&Unit::Milliliters).unwrap(), "\"ml\"");
        let unit: Unit = serde_json::from_str("\"un\"").unwrap();
        assert_eq!(unit, Unit::Units);
        assert_eq!(Unit::default(), Unit::Grams);
    }

    #[test]
    fn test_display_formatting() {
        let milk = ParsedIngredient::new("Leite", 150.0, Unit::Milliliters).unwrap();
        assert_eq!(milk.to_string(), "Leite: 150ml");

        let banana = ParsedIngredient::new("Banana", 0.5, Unit::Units).unwrap();
        assert_eq!(banana.to_string(), "Banana: 0.5un");
    }

    #[test]
    fn test_not_found_sentinel() {
        let parsed = ParsedIngredient::new("Quinoa", 30.0, Unit::Grams).unwrap();
        let resolved = ResolvedIngredient::not_found(parsed);

        assert!(!resolved.is_found());
        assert_eq!(resolved.category, NOT_FOUND_CATEGORY);
        assert_eq!(resolved.description, "Quinoa");
        assert!(resolved.nutrients.is_none());
    }

    #[test]
    fn test_empty_result() {
        let result = MealNutritionResult::empty();
        assert!(result.foods.is_empty());
        assert!(result.totals.is_none());
        assert_eq!(result.source, ExtractionSource::None);
        assert!(!result.is_degraded());
    }
}
