//! # Nutrient Aggregator
//!
//! Folds scaled nutrient vectors into meal, day and period totals.
//!
//! "No data" is always `None`, never an all-zero vector: an empty input
//! produces `None`, any non-empty input produces a fully populated
//! [`NutritionTotals`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::nutrients::NutritionTotals;

/// Sum nutrient vectors element-wise
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::aggregator::aggregate;
/// use nutrition_engine::nutrients::{Nutrient, NutritionTotals};
///
/// assert!(aggregate(Vec::<&NutritionTotals>::new()).is_none());
///
/// let mut rice = NutritionTotals::zero();
/// rice.set(Nutrient::Protein, 1.5);
/// let total = aggregate([&rice, &rice]).unwrap();
/// assert_eq!(total.get(Nutrient::Protein), 3.0);
/// ```
pub fn aggregate<'a, I>(vectors: I) -> Option<NutritionTotals>
where
    I: IntoIterator<Item = &'a NutritionTotals>,
{
    vectors.into_iter().fold(None, |acc, v| match acc {
        None => Some(*v),
        Some(total) => Some(total + *v),
    })
}

/// Fixed meal times of a daycare day, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    MorningSnack,
    Lunch,
    Bottle,
    Snack,
    PreDinner,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 7] = [
        MealSlot::Breakfast,
        MealSlot::MorningSnack,
        MealSlot::Lunch,
        MealSlot::Bottle,
        MealSlot::Snack,
        MealSlot::PreDinner,
        MealSlot::Dinner,
    ];

    /// Portuguese label shown in menus
    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Café da manhã",
            MealSlot::MorningSnack => "Lanche da manhã",
            MealSlot::Lunch => "Almoço",
            MealSlot::Bottle => "Mamadeira",
            MealSlot::Snack => "Lanche",
            MealSlot::PreDinner => "Pré-jantar",
            MealSlot::Dinner => "Jantar",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Position of a meal in a multi-day menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: usize,
    pub slot: MealSlot,
}

impl SlotKey {
    pub fn new(day: usize, slot: MealSlot) -> Self {
        Self { day, slot }
    }
}

/// Totals of one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub day_index: usize,
    pub totals: NutritionTotals,
    /// Slots that contributed data, in slot order
    pub slots: Vec<MealSlot>,
}

/// Fold the meal slots of one day
///
/// Slots are visited in [`MealSlot::ALL`] order; missing slots and slots
/// with `None` totals are skipped. Returns `None` when no slot of the day has
/// data.
pub fn aggregate_day(
    day_index: usize,
    slot_results: &HashMap<SlotKey, Option<NutritionTotals>>,
) -> Option<DailyAggregate> {
    let mut totals: Option<NutritionTotals> = None;
    let mut slots = Vec::new();

    for slot in MealSlot::ALL {
        let Some(Some(slot_totals)) = slot_results.get(&SlotKey::new(day_index, slot)) else {
            continue;
        };
        totals = Some(totals.map_or(*slot_totals, |sum| sum + *slot_totals));
        slots.push(slot);
    }

    totals.map(|totals| DailyAggregate {
        day_index,
        totals,
        slots,
    })
}

/// Totals across several days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub total: NutritionTotals,
    pub days_with_data: usize,
    /// `total` divided by `days_with_data`
    pub daily_average: NutritionTotals,
}

/// Fold daily aggregates into a period summary
///
/// Returns `None` when no day has data.
pub fn summarize_period<'a, I>(days: I) -> Option<PeriodSummary>
where
    I: IntoIterator<Item = &'a DailyAggregate>,
{
    let days: Vec<&DailyAggregate> = days.into_iter().collect();
    let total = aggregate(days.iter().map(|d| &d.totals))?;
    let days_with_data = days.len();

    Some(PeriodSummary {
        total,
        days_with_data,
        daily_average: total.scaled(1.0 / days_with_data as f64),
    })
}
