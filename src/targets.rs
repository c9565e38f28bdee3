//! # Reference Daily Targets
//!
//! Dietary reference intakes for the age bands served by daycare menus, and
//! a comparison of consumed totals against them.
//!
//! Values are daily RDA/AI figures in the unit of each [`Nutrient`]. Energy
//! is an estimated requirement. Nutrients without an established reference
//! for a band (e.g. fiber for infants, lipid composition) are left out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::nutrients::{Nutrient, NutritionTotals};

/// Age bands with distinct reference intakes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    /// 7 to 12 months
    Infant,
    /// 1 to 3 years
    Toddler,
    /// 4 to 8 years
    Child,
}

impl AgeBand {
    pub const ALL: [AgeBand; 3] = [AgeBand::Infant, AgeBand::Toddler, AgeBand::Child];

    /// Band for an age given in months
    ///
    /// Returns `None` below 7 months (milk-only diet) and above 8 years.
    pub fn from_age_months(months: u32) -> Option<AgeBand> {
        match months {
            7..=11 => Some(AgeBand::Infant),
            12..=47 => Some(AgeBand::Toddler),
            48..=107 => Some(AgeBand::Child),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Infant => "7 a 12 meses",
            AgeBand::Toddler => "1 a 3 anos",
            AgeBand::Child => "4 a 8 anos",
        }
    }
}

impl FromStr for AgeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "infant" | "bebe" | "7-12m" => Ok(AgeBand::Infant),
            "toddler" | "1-3" => Ok(AgeBand::Toddler),
            "child" | "crianca" | "4-8" => Ok(AgeBand::Child),
            other => Err(format!("Unknown age band: {other}")),
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

const INFANT_TARGETS: &[(Nutrient, f64)] = &[
    (Nutrient::Energy, 700.0),
    (Nutrient::Protein, 11.0),
    (Nutrient::Lipid, 30.0),
    (Nutrient::Carbohydrate, 95.0),
    (Nutrient::Calcium, 260.0),
    (Nutrient::Iron, 11.0),
    (Nutrient::Sodium, 370.0),
    (Nutrient::Potassium, 860.0),
    (Nutrient::Magnesium, 75.0),
    (Nutrient::Phosphorus, 275.0),
    (Nutrient::Zinc, 3.0),
    (Nutrient::Copper, 0.22),
    (Nutrient::Manganese, 0.6),
    (Nutrient::VitaminC, 50.0),
    (Nutrient::VitaminA, 500.0),
    (Nutrient::Thiamine, 0.3),
    (Nutrient::Riboflavin, 0.4),
    (Nutrient::Pyridoxine, 0.3),
    (Nutrient::Niacin, 4.0),
];

const TODDLER_TARGETS: &[(Nutrient, f64)] = &[
    (Nutrient::Energy, 1000.0),
    (Nutrient::Protein, 13.0),
    (Nutrient::Lipid, 35.0),
    (Nutrient::Carbohydrate, 130.0),
    (Nutrient::Fiber, 19.0),
    (Nutrient::Calcium, 700.0),
    (Nutrient::Iron, 7.0),
    (Nutrient::Sodium, 800.0),
    (Nutrient::Potassium, 2000.0),
    (Nutrient::Magnesium, 80.0),
    (Nutrient::Phosphorus, 460.0),
    (Nutrient::Zinc, 3.0),
    (Nutrient::Copper, 0.34),
    (Nutrient::Manganese, 1.2),
    (Nutrient::VitaminC, 15.0),
    (Nutrient::VitaminA, 300.0),
    (Nutrient::Thiamine, 0.5),
    (Nutrient::Riboflavin, 0.5),
    (Nutrient::Pyridoxine, 0.5),
    (Nutrient::Niacin, 6.0),
];

const CHILD_TARGETS: &[(Nutrient, f64)] = &[
    (Nutrient::Energy, 1400.0),
    (Nutrient::Protein, 19.0),
    (Nutrient::Lipid, 45.0),
    (Nutrient::Carbohydrate, 130.0),
    (Nutrient::Fiber, 25.0),
    (Nutrient::Calcium, 1000.0),
    (Nutrient::Iron, 10.0),
    (Nutrient::Sodium, 1000.0),
    (Nutrient::Potassium, 2300.0),
    (Nutrient::Magnesium, 130.0),
    (Nutrient::Phosphorus, 500.0),
    (Nutrient::Zinc, 5.0),
    (Nutrient::Copper, 0.44),
    (Nutrient::Manganese, 1.5),
    (Nutrient::VitaminC, 25.0),
    (Nutrient::VitaminA, 400.0),
    (Nutrient::Thiamine, 0.6),
    (Nutrient::Riboflavin, 0.6),
    (Nutrient::Pyridoxine, 0.6),
    (Nutrient::Niacin, 8.0),
];

/// Progress of one nutrient towards its daily target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetProgress {
    pub nutrient: Nutrient,
    pub consumed: f64,
    pub target: f64,
    /// `consumed / target * 100`
    pub percent: f64,
}

/// Daily reference intakes of one age band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientTargets {
    band: AgeBand,
    values: &'static [(Nutrient, f64)],
}

impl NutrientTargets {
    /// Reference intakes for an age band
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nutrition_engine::nutrients::Nutrient;
    /// use nutrition_engine::targets::{AgeBand, NutrientTargets};
    ///
    /// let targets = NutrientTargets::for_band(AgeBand::Toddler);
    /// assert_eq!(targets.target(Nutrient::Calcium), Some(700.0));
    /// assert_eq!(targets.target(Nutrient::Cholesterol), None);
    /// ```
    pub fn for_band(band: AgeBand) -> Self {
        let values = match band {
            AgeBand::Infant => INFANT_TARGETS,
            AgeBand::Toddler => TODDLER_TARGETS,
            AgeBand::Child => CHILD_TARGETS,
        };
        Self { band, values }
    }

    pub fn band(&self) -> AgeBand {
        self.band
    }

    pub fn target(&self, nutrient: Nutrient) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| *n == nutrient)
            .map(|(_, value)| *value)
    }

    /// Compare consumed totals against every target of the band
    pub fn compare(&self, totals: &NutritionTotals) -> Vec<TargetProgress> {
        self.values
            .iter()
            .map(|&(nutrient, target)| {
                let consumed = totals.get(nutrient);
                TargetProgress {
                    nutrient,
                    consumed,
                    target,
                    percent: consumed / target * 100.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_band_from_months() {
        assert_eq!(AgeBand::from_age_months(6), None);
        assert_eq!(AgeBand::from_age_months(7), Some(AgeBand::Infant));
        assert_eq!(AgeBand::from_age_months(12), Some(AgeBand::Toddler));
        assert_eq!(AgeBand::from_age_months(47), Some(AgeBand::Toddler));
        assert_eq!(AgeBand::from_age_months(48), Some(AgeBand::Child));
        assert_eq!(AgeBand::from_age_months(108), None);
    }

    #[test]
    fn test_age_band_parsing() {
        assert_eq!("Toddler".parse::<AgeBand>(), Ok(AgeBand::Toddler));
        assert_eq!("4-8".parse::<AgeBand>(), Ok(AgeBand::Child));
        assert!("adult".parse::<AgeBand>().is_err());
    }

    #[test]
    fn test_targets_are_positive_and_unique() {
        for band in AgeBand::ALL {
            let targets = NutrientTargets::for_band(band);
            for (i, (nutrient, value)) in targets.values.iter().enumerate() {
                assert!(*value > 0.0, "{band} {nutrient}");
                assert!(
                    targets.values[i + 1..].iter().all(|(n, _)| n != nutrient),
                    "duplicate {nutrient} for {band}"
                );
            }
            assert!(targets.target(Nutrient::Energy).is_some());
        }
    }

    #[test]
    fn test_compare_reports_percent() {
        let mut totals = NutritionTotals::zero();
        totals.set(Nutrient::Energy, 500.0);
        totals.set(Nutrient::Iron, 3.5);

        let progress = NutrientTargets::for_band(AgeBand::Toddler).compare(&totals);
        let energy = progress.iter().find(|p| p.nutrient == Nutrient::Energy).unwrap();
        assert_eq!(energy.target, 1000.0);
        assert_eq!(energy.percent, 50.0);

        let iron = progress.iter().find(|p| p.nutrient == Nutrient::Iron).unwrap();
        assert_eq!(iron.percent, 50.0);

        let calcium = progress.iter().find(|p| p.nutrient == Nutrient::Calcium).unwrap();
        assert_eq!(calcium.consumed, 0.0);
        assert_eq!(calcium.percent, 0.0);
    }
}
