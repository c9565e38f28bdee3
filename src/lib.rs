//! # Nutrition Engine
//!
//! Turns free-text meal descriptions ("frango grelhado com arroz e feijão")
//! into nutrient breakdowns backed by a TACO-style food-composition table.
//!
//! A resolution runs extraction (AI service or legacy pattern parser), fuzzy
//! matching against the table, quantity scaling and aggregation. Meal totals
//! fold further into day and period totals, and can be compared against
//! reference daily targets.

pub mod aggregator;
pub mod circuit_breaker;
pub mod composition;
pub mod composition_source;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod extractor;
pub mod ingredient_model;
pub mod legacy_parser;
pub mod matcher;
pub mod nutrients;
pub mod resolver;
pub mod scaler;
pub mod targets;
pub mod text_normalizer;

pub use aggregator::{aggregate, aggregate_day, summarize_period, DailyAggregate, MealSlot, PeriodSummary, SlotKey};
pub use config::EngineConfig;
pub use errors::{ExtractionError, ResolveError, TableError};
pub use ingredient_model::{MealNutritionResult, ParsedIngredient, ResolvedIngredient, Unit};
pub use nutrients::{Nutrient, NutritionTotals};
pub use resolver::NutritionResolver;
