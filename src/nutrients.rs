//! # Nutrient Schema Module
//!
//! This module owns the fixed nutrient key set tracked by the engine and the
//! `NutritionTotals` vector built on top of it.
//!
//! Every nutrient is an enum variant, and every accessor goes through an
//! exhaustive `match`, so adding a nutrient fails to compile until scaling,
//! aggregation and display all know about it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// The nutrients tracked per ingredient, meal and day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    // Macronutrients
    Energy,
    Protein,
    Lipid,
    Carbohydrate,
    Fiber,

    // Minerals
    Calcium,
    Iron,
    Sodium,
    Potassium,
    Magnesium,
    Phosphorus,
    Zinc,
    Copper,
    Manganese,

    // Vitamins
    VitaminC,
    VitaminA,
    Retinol,
    Thiamine,
    Riboflavin,
    Pyridoxine,
    Niacin,

    // Lipid composition
    Cholesterol,
    Saturated,
    Monounsaturated,
    Polyunsaturated,
}

/// Broad grouping used for display and reference targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientGroup {
    Macro,
    Mineral,
    Vitamin,
    LipidComposition,
}

impl Nutrient {
    /// All nutrients in schema order
    pub const ALL: [Nutrient; 25] = [
        Nutrient::Energy,
        Nutrient::Protein,
        Nutrient::Lipid,
        Nutrient::Carbohydrate,
        Nutrient::Fiber,
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::Sodium,
        Nutrient::Potassium,
        Nutrient::Magnesium,
        Nutrient::Phosphorus,
        Nutrient::Zinc,
        Nutrient::Copper,
        Nutrient::Manganese,
        Nutrient::VitaminC,
        Nutrient::VitaminA,
        Nutrient::Retinol,
        Nutrient::Thiamine,
        Nutrient::Riboflavin,
        Nutrient::Pyridoxine,
        Nutrient::Niacin,
        Nutrient::Cholesterol,
        Nutrient::Saturated,
        Nutrient::Monounsaturated,
        Nutrient::Polyunsaturated,
    ];

    /// Key used in composition records and serialized totals
    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Energy => "energy",
            Nutrient::Protein => "protein",
            Nutrient::Lipid => "lipid",
            Nutrient::Carbohydrate => "carbohydrate",
            Nutrient::Fiber => "fiber",
            Nutrient::Calcium => "calcium",
            Nutrient::Iron => "iron",
            Nutrient::Sodium => "sodium",
            Nutrient::Potassium => "potassium",
            Nutrient::Magnesium => "magnesium",
            Nutrient::Phosphorus => "phosphorus",
            Nutrient::Zinc => "zinc",
            Nutrient::Copper => "copper",
            Nutrient::Manganese => "manganese",
            Nutrient::VitaminC => "vitamin_c",
            Nutrient::VitaminA => "vitamin_a",
            Nutrient::Retinol => "retinol",
            Nutrient::Thiamine => "thiamine",
            Nutrient::Riboflavin => "riboflavin",
            Nutrient::Pyridoxine => "pyridoxine",
            Nutrient::Niacin => "niacin",
            Nutrient::Cholesterol => "cholesterol",
            Nutrient::Saturated => "saturated",
            Nutrient::Monounsaturated => "monounsaturated",
            Nutrient::Polyunsaturated => "polyunsaturated",
        }
    }

    /// Look up a nutrient by its record key
    ///
    /// Accepts a few spellings seen in composition feeds
    /// (`carbohydrates`, `dietary_fiber`, `vitaminC`).
    pub fn from_key(key: &str) -> Option<Nutrient> {
        let key = key.trim().to_lowercase().replace(['-', ' '], "_");
        let nutrient = match key.as_str() {
            "energy" | "energia" | "kcal" => Nutrient::Energy,
            "protein" | "proteina" => Nutrient::Protein,
            "lipid" | "lipids" | "lipidios" => Nutrient::Lipid,
            "carbohydrate" | "carbohydrates" | "carboidrato" => Nutrient::Carbohydrate,
            "fiber" | "dietary_fiber" | "fibra" => Nutrient::Fiber,
            "calcium" => Nutrient::Calcium,
            "iron" => Nutrient::Iron,
            "sodium" => Nutrient::Sodium,
            "potassium" => Nutrient::Potassium,
            "magnesium" => Nutrient::Magnesium,
            "phosphorus" => Nutrient::Phosphorus,
            "zinc" => Nutrient::Zinc,
            "copper" => Nutrient::Copper,
            "manganese" => Nutrient::Manganese,
            "vitamin_c" | "vitaminc" => Nutrient::VitaminC,
            "vitamin_a" | "vitamina" | "re" | "rae" => Nutrient::VitaminA,
            "retinol" => Nutrient::Retinol,
            "thiamine" | "thiamin" => Nutrient::Thiamine,
            "riboflavin" => Nutrient::Riboflavin,
            "pyridoxine" => Nutrient::Pyridoxine,
            "niacin" => Nutrient::Niacin,
            "cholesterol" => Nutrient::Cholesterol,
            "saturated" => Nutrient::Saturated,
            "monounsaturated" => Nutrient::Monounsaturated,
            "polyunsaturated" => Nutrient::Polyunsaturated,
            _ => return None,
        };
        Some(nutrient)
    }

    /// Unit in which values of this nutrient are expressed
    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Energy => "kcal",
            Nutrient::Protein
            | Nutrient::Lipid
            | Nutrient::Carbohydrate
            | Nutrient::Fiber
            | Nutrient::Saturated
            | Nutrient::Monounsaturated
            | Nutrient::Polyunsaturated => "g",
            Nutrient::VitaminA | Nutrient::Retinol => "µg",
            Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Sodium
            | Nutrient::Potassium
            | Nutrient::Magnesium
            | Nutrient::Phosphorus
            | Nutrient::Zinc
            | Nutrient::Copper
            | Nutrient::Manganese
            | Nutrient::VitaminC
            | Nutrient::Thiamine
            | Nutrient::Riboflavin
            | Nutrient::Pyridoxine
            | Nutrient::Niacin
            | Nutrient::Cholesterol => "mg",
        }
    }

    /// Portuguese display label
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Energy => "Energia",
            Nutrient::Protein => "Proteína",
            Nutrient::Lipid => "Lipídios",
            Nutrient::Carbohydrate => "Carboidrato",
            Nutrient::Fiber => "Fibra alimentar",
            Nutrient::Calcium => "Cálcio",
            Nutrient::Iron => "Ferro",
            Nutrient::Sodium => "Sódio",
            Nutrient::Potassium => "Potássio",
            Nutrient::Magnesium => "Magnésio",
            Nutrient::Phosphorus => "Fósforo",
            Nutrient::Zinc => "Zinco",
            Nutrient::Copper => "Cobre",
            Nutrient::Manganese => "Manganês",
            Nutrient::VitaminC => "Vitamina C",
            Nutrient::VitaminA => "Vitamina A (RAE)",
            Nutrient::Retinol => "Retinol",
            Nutrient::Thiamine => "Tiamina",
            Nutrient::Riboflavin => "Riboflavina",
            Nutrient::Pyridoxine => "Piridoxina",
            Nutrient::Niacin => "Niacina",
            Nutrient::Cholesterol => "Colesterol",
            Nutrient::Saturated => "Saturados",
            Nutrient::Monounsaturated => "Monoinsaturados",
            Nutrient::Polyunsaturated => "Poli-insaturados",
        }
    }

    pub fn group(self) -> NutrientGroup {
        match self {
            Nutrient::Energy
            | Nutrient::Protein
            | Nutrient::Lipid
            | Nutrient::Carbohydrate
            | Nutrient::Fiber => NutrientGroup::Macro,
            Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Sodium
            | Nutrient::Potassium
            | Nutrient::Magnesium
            | Nutrient::Phosphorus
            | Nutrient::Zinc
            | Nutrient::Copper
            | Nutrient::Manganese => NutrientGroup::Mineral,
            Nutrient::VitaminC
            | Nutrient::VitaminA
            | Nutrient::Retinol
            | Nutrient::Thiamine
            | Nutrient::Riboflavin
            | Nutrient::Pyridoxine
            | Nutrient::Niacin => NutrientGroup::Vitamin,
            Nutrient::Cholesterol
            | Nutrient::Saturated
            | Nutrient::Monounsaturated
            | Nutrient::Polyunsaturated => NutrientGroup::LipidComposition,
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Fixed-schema nutrient vector
///
/// All values are non-negative and expressed in the unit returned by
/// [`Nutrient::unit`]. "No data" is represented by `Option<NutritionTotals>`
/// being `None`, never by an all-zero vector.
///
/// # Examples
///
/// ```rust
/// use nutrition_engine::nutrients::{Nutrient, NutritionTotals};
///
/// let mut rice = NutritionTotals::zero();
/// rice.set(Nutrient::Energy, 128.0);
/// let mut beans = NutritionTotals::zero();
/// beans.set(Nutrient::Energy, 76.0);
///
/// let meal = rice + beans;
/// assert_eq!(meal.get(Nutrient::Energy), 204.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NutritionTotals {
    energy: f64,
    protein: f64,
    lipid: f64,
    carbohydrate: f64,
    fiber: f64,
    calcium: f64,
    iron: f64,
    sodium: f64,
    potassium: f64,
    magnesium: f64,
    phosphorus: f64,
    zinc: f64,
    copper: f64,
    manganese: f64,
    vitamin_c: f64,
    vitamin_a: f64,
    retinol: f64,
    thiamine: f64,
    riboflavin: f64,
    pyridoxine: f64,
    niacin: f64,
    cholesterol: f64,
    saturated: f64,
    monounsaturated: f64,
    polyunsaturated: f64,
}

impl NutritionTotals {
    /// A fully-populated vector with every nutrient at zero
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Energy => self.energy,
            Nutrient::Protein => self.protein,
            Nutrient::Lipid => self.lipid,
            Nutrient::Carbohydrate => self.carbohydrate,
            Nutrient::Fiber => self.fiber,
            Nutrient::Calcium => self.calcium,
            Nutrient::Iron => self.iron,
            Nutrient::Sodium => self.sodium,
            Nutrient::Potassium => self.potassium,
            Nutrient::Magnesium => self.magnesium,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Zinc => self.zinc,
            Nutrient::Copper => self.copper,
            Nutrient::Manganese => self.manganese,
            Nutrient::VitaminC => self.vitamin_c,
            Nutrient::VitaminA => self.vitamin_a,
            Nutrient::Retinol => self.retinol,
            Nutrient::Thiamine => self.thiamine,
            Nutrient::Riboflavin => self.riboflavin,
            Nutrient::Pyridoxine => self.pyridoxine,
            Nutrient::Niacin => self.niacin,
            Nutrient::Cholesterol => self.cholesterol,
            Nutrient::Saturated => self.saturated,
            Nutrient::Monounsaturated => self.monounsaturated,
            Nutrient::Polyunsaturated => self.polyunsaturated,
        }
    }

    fn slot_mut(&mut self, nutrient: Nutrient) -> &mut f64 {
        match nutrient {
            Nutrient::Energy => &mut self.energy,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Lipid => &mut self.lipid,
            Nutrient::Carbohydrate => &mut self.carbohydrate,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Calcium => &mut self.calcium,
            Nutrient::Iron => &mut self.iron,
            Nutrient::Sodium => &mut self.sodium,
            Nutrient::Potassium => &mut self.potassium,
            Nutrient::Magnesium => &mut self.magnesium,
            Nutrient::Phosphorus => &mut self.phosphorus,
            Nutrient::Zinc => &mut self.zinc,
            Nutrient::Copper => &mut self.copper,
            Nutrient::Manganese => &mut self.manganese,
            Nutrient::VitaminC => &mut self.vitamin_c,
            Nutrient::VitaminA => &mut self.vitamin_a,
            Nutrient::Retinol => &mut self.retinol,
            Nutrient::Thiamine => &mut self.thiamine,
            Nutrient::Riboflavin => &mut self.riboflavin,
            Nutrient::Pyridoxine => &mut self.pyridoxine,
            Nutrient::Niacin => &mut self.niacin,
            Nutrient::Cholesterol => &mut self.cholesterol,
            Nutrient::Saturated => &mut self.saturated,
            Nutrient::Monounsaturated => &mut self.monounsaturated,
            Nutrient::Polyunsaturated => &mut self.polyunsaturated,
        }
    }

    /// Set a nutrient value, clamping negatives and non-finite values to zero
    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        *self.slot_mut(nutrient) = if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        };
    }

    /// Iterate `(nutrient, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.iter().map(move |&n| (n, self.get(n)))
    }

    /// Multiply every nutrient by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = Self::zero();
        for nutrient in Nutrient::ALL {
            out.set(nutrient, self.get(nutrient) * factor);
        }
        out
    }

    /// Whether every nutrient is exactly zero
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, value)| value == 0.0)
    }

    /// Element-wise comparison with an absolute tolerance
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        Nutrient::ALL
            .iter()
            .all(|&n| (self.get(n) - other.get(n)).abs() <= epsilon)
    }
}

impl AddAssign for NutritionTotals {
    fn add_assign(&mut self, other: Self) {
        for nutrient in Nutrient::ALL {
            *self.slot_mut(nutrient) += other.get(nutrient);
        }
    }
}

impl Add for NutritionTotals {
    type Output = NutritionTotals;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Mul<f64> for NutritionTotals {
    type Output = NutritionTotals;

    fn mul(self, factor: f64) -> Self::Output {
        self.scaled(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_nutrients_are_distinct() {
        let keys: HashSet<&str> = Nutrient::ALL.iter().map(|n| n.key()).collect();
        assert_eq!(keys.len(), Nutrient::ALL.len());
    }

    #[test]
    fn test_key_round_trip() {
        for nutrient in Nutrient::ALL {
            assert_eq!(Nutrient::from_key(nutrient.key()), Some(nutrient));
        }
        assert_eq!(Nutrient::from_key("carbohydrates"), Some(Nutrient::Carbohydrate));
        assert_eq!(Nutrient::from_key("dietary-fiber"), Some(Nutrient::Fiber));
        assert_eq!(Nutrient::from_key("humidity"), None);
    }

    #[test]
    fn test_serialized_field_names_match_keys() {
        let mut totals = NutritionTotals::zero();
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            totals.set(*nutrient, i as f64 + 1.0);
        }

        let json = serde_json::to_value(totals).unwrap();
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            assert_eq!(json[nutrient.key()], serde_json::json!(i as f64 + 1.0));
        }
    }

    #[test]
    fn test_set_clamps_invalid_values() {
        let mut totals = NutritionTotals::zero();
        totals.set(Nutrient::Sodium, -3.0);
        totals.set(Nutrient::Iron, f64::NAN);
        assert_eq!(totals.get(Nutrient::Sodium), 0.0);
        assert_eq!(totals.get(Nutrient::Iron), 0.0);
        assert!(totals.is_zero());
    }

    #[test]
    fn test_addition_and_scaling() {
        let mut a = NutritionTotals::zero();
        a.set(Nutrient::Protein, 2.5);
        a.set(Nutrient::Calcium, 10.0);
        let mut b = NutritionTotals::zero();
        b.set(Nutrient::Protein, 1.5);

        let sum = a + b;
        assert_eq!(sum.get(Nutrient::Protein), 4.0);
        assert_eq!(sum.get(Nutrient::Calcium), 10.0);

        let doubled = sum * 2.0;
        assert_eq!(doubled.get(Nutrient::Protein), 8.0);
        assert_eq!(doubled.get(Nutrient::Calcium), 20.0);
    }

    #[test]
    fn test_values_never_go_negative() {
        let mut totals = NutritionTotals::zero();
        totals.set(Nutrient::Energy, 120.0);
        totals.set(Nutrient::Fiber, 3.0);

        let flipped = totals * -1.0;
        assert!(flipped.iter().all(|(_, value)| value >= 0.0));
        assert!(flipped.is_zero());

        let nan = totals.scaled(f64::NAN);
        assert!(nan.iter().all(|(_, value)| value == 0.0));
    }

    #[test]
    fn test_units_and_groups() {
        assert_eq!(Nutrient::Energy.unit(), "kcal");
        assert_eq!(Nutrient::Iron.unit(), "mg");
        assert_eq!(Nutrient::Retinol.unit(), "µg");
        assert_eq!(Nutrient::Saturated.group(), NutrientGroup::LipidComposition);
        assert_eq!(Nutrient::Niacin.group(), NutrientGroup::Vitamin);
    }
}
