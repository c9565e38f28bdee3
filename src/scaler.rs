//! # Quantity Scaler
//!
//! Converts per-base-quantity nutrient values of a composition record into
//! values for the quantity actually eaten.
//!
//! Records store nutrients per 100 g or 100 ml. A requested amount in `un`
//! is applied numerically against the same base.

use log::warn;

use crate::composition::{CompositionRecord, DEFAULT_BASE_QUANTITY};
use crate::nutrients::{Nutrient, NutritionTotals};

/// Scale a record's nutrients to `requested_quantity`
///
/// Each nutrient is `amount * requested / base_quantity`. Missing attributes
/// contribute zero. No rounding is applied.
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::composition::CompositionTable;
/// use nutrition_engine::nutrients::Nutrient;
/// use nutrition_engine::scaler::scale;
///
/// let json = r#"[{"id": 2, "description": "Arroz, tipo 1, cozido",
///                 "attributes": {"energy": {"qty": 128.0, "unit": "kcal"}}}]"#;
/// let table = CompositionTable::from_json(json)?;
///
/// let portion = scale(table.get(2).unwrap(), 60.0);
/// assert!((portion.get(Nutrient::Energy) - 76.8).abs() < 1e-9);
/// assert_eq!(portion.get(Nutrient::Protein), 0.0);
/// # Ok::<(), nutrition_engine::errors::TableError>(())
/// ```
pub fn scale(record: &CompositionRecord, requested_quantity: f64) -> NutritionTotals {
    let base = effective_base(record);
    let factor = requested_quantity / base;

    let mut totals = NutritionTotals::zero();
    for nutrient in Nutrient::ALL {
        totals.set(nutrient, record.amount(nutrient) * factor);
    }
    totals
}

fn effective_base(record: &CompositionRecord) -> f64 {
    if record.base_quantity.is_finite() && record.base_quantity > 0.0 {
        record.base_quantity
    } else {
        warn!(
            "Record {} ('{}') has invalid base quantity {}, assuming {}",
            record.id, record.description, record.base_quantity, DEFAULT_BASE_QUANTITY
        );
        DEFAULT_BASE_QUANTITY
    }
}
