//! # Composition Table Module
//!
//! Reference food-composition data (TACO-style): canonical food records with
//! nutrient values per 100 g or 100 ml.
//!
//! Records are immutable once loaded. Deserialization is tolerant of the
//! quirks of real composition feeds:
//!
//! - attribute amounts under `quantity` or `qty`
//! - amounts given as numbers or numeric strings, with decimal point or comma
//! - markers such as `"NA"`, `"Tr"` (traces) or `"*"` read as zero
//! - unknown attribute keys (humidity, ash, ...) ignored

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::TableError;
use crate::ingredient_model::Unit;
use crate::nutrients::Nutrient;

/// Default base quantity of a record (per 100 g / 100 ml)
pub const DEFAULT_BASE_QUANTITY: f64 = 100.0;

/// Bundled sample of the TACO table used when no lookup service is configured
const BUNDLED_TABLE_JSON: &str = include_str!("../data/taco_sample.json");

/// Amount of one nutrient per base quantity of a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientAttribute {
    pub quantity: f64,
    pub unit: String,
}

/// A canonical food record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRecord {
    pub id: u32,
    /// Canonical name (e.g. "Arroz, tipo 1, cozido")
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_base_quantity", alias = "base_qty")]
    pub base_quantity: f64,
    #[serde(default)]
    pub base_unit: Unit,
    /// Nutrient amounts per `base_quantity`; missing nutrients count as zero
    #[serde(default, deserialize_with = "deserialize_attributes")]
    pub attributes: BTreeMap<Nutrient, NutrientAttribute>,
}

fn default_base_quantity() -> f64 {
    DEFAULT_BASE_QUANTITY
}

impl CompositionRecord {
    /// Amount of a nutrient per base quantity (zero when absent)
    pub fn amount(&self, nutrient: Nutrient) -> f64 {
        self.attributes
            .get(&nutrient)
            .map(|a| a.quantity)
            .unwrap_or(0.0)
    }
}

/// Read a raw amount, accepting numbers and numeric strings
///
/// Returns `None` for markers like "NA", "Tr" or "*", and for negative
/// or non-finite values.
fn read_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    if amount.is_finite() && amount >= 0.0 {
        Some(amount)
    } else {
        None
    }
}

fn deserialize_attributes<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<Nutrient, NutrientAttribute>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Value> = Option::deserialize(deserializer)?.unwrap_or_default();
    let mut attributes = BTreeMap::new();

    for (key, value) in raw {
        let Some(nutrient) = Nutrient::from_key(&key) else {
            continue;
        };

        let (amount, unit) = match &value {
            Value::Object(fields) => {
                let amount = fields
                    .get("quantity")
                    .or_else(|| fields.get("qty"))
                    .and_then(read_amount);
                let unit = fields
                    .get("unit")
                    .and_then(Value::as_str)
                    .unwrap_or(nutrient.unit())
                    .to_string();
                (amount, unit)
            }
            other => (read_amount(other), nutrient.unit().to_string()),
        };

        if let Some(quantity) = amount {
            attributes.insert(nutrient, NutrientAttribute { quantity, unit });
        }
    }

    Ok(attributes)
}

/// Immutable, ordered collection of composition records
///
/// Table order is significant: the matcher breaks score ties by it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionTable {
    records: Vec<CompositionRecord>,
}

impl CompositionTable {
    pub fn new(records: Vec<CompositionRecord>) -> Self {
        Self { records }
    }

    /// Parse a table from a JSON array of records
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nutrition_engine::composition::CompositionTable;
    /// use nutrition_engine::nutrients::Nutrient;
    ///
    /// let json = r#"[{"id": 1, "description": "Arroz, tipo 1, cozido",
    ///                 "category": "Cereais e derivados",
    ///                 "attributes": {"energy": {"qty": 128.3, "unit": "kcal"},
    ///                                "protein": {"quantity": "2,5", "unit": "g"},
    ///                                "sodium": {"qty": "Tr", "unit": "mg"}}}]"#;
    /// let table = CompositionTable::from_json(json)?;
    ///
    /// let rice = &table.records()[0];
    /// assert_eq!(rice.amount(Nutrient::Energy), 128.3);
    /// assert_eq!(rice.amount(Nutrient::Protein), 2.5);
    /// assert_eq!(rice.amount(Nutrient::Sodium), 0.0);
    /// # Ok::<(), nutrition_engine::errors::TableError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let records: Vec<CompositionRecord> = serde_json::from_str(json)
            .map_err(|e| TableError::Malformed(format!("Invalid composition table: {e}")))?;
        debug!("Parsed composition table with {} records", records.len());
        Ok(Self::new(records))
    }

    /// Load a table from a JSON file on disk
    pub fn from_file(path: &Path) -> Result<Self, TableError> {
        info!("Loading composition table from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            TableError::Unavailable(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// The sample TACO table compiled into the crate
    pub fn bundled() -> Result<Self, TableError> {
        let table = Self::from_json(BUNDLED_TABLE_JSON)?;
        if table.is_empty() {
            warn!("Bundled composition table is empty");
        }
        Ok(table)
    }

    pub fn records(&self) -> &[CompositionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by id
    pub fn get(&self, id: u32) -> Option<&CompositionRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}
