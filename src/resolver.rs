//! # Nutrition Resolver
//!
//! Request coordinator and result cache: the entry point of the engine.
//!
//! A [`NutritionResolver`] owns one resolution cache and allows one
//! extraction in flight. A `resolve` call that misses the cache cancels the
//! previous in-flight call of the same resolver; the superseded caller gets
//! [`ResolveError::Superseded`] and its result is never cached.
//!
//! ```rust,no_run
//! use nutrition_engine::config::EngineConfig;
//! use nutrition_engine::resolver::NutritionResolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = NutritionResolver::from_config(&EngineConfig::from_env()?)?;
//! let result = resolver.resolve("Arroz: 60g, Feijão: 50g").await?;
//! println!("{} foods, {} found", result.foods.len(), result.found_count());
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::aggregate;
use crate::composition::{CompositionRecord, CompositionTable};
use crate::composition_source::{source_from_config, CachedCompositionTable};
use crate::config::{EngineConfig, MIN_INPUT_CHARS};
use crate::errors::{ResolveError, TableError};
use crate::extractor::{Extraction, IngredientExtractor};
use crate::ingredient_model::{MealNutritionResult, ResolutionWarning, ResolvedIngredient};
use crate::matcher::FoodMatcher;
use crate::scaler::scale;

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Cached, cancellable meal resolution
pub struct NutritionResolver {
    extractor: IngredientExtractor,
    table: CachedCompositionTable,
    matcher: FoodMatcher,
    cache: Mutex<HashMap<String, MealNutritionResult>>,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NutritionResolver {
    pub fn new(
        extractor: IngredientExtractor,
        table: CachedCompositionTable,
        matcher: FoodMatcher,
    ) -> Self {
        Self {
            extractor,
            table,
            matcher,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Wire services, table source and matcher from configuration
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let extractor = IngredientExtractor::from_config(&config.extraction)?;
        let source = source_from_config(&config.composition)?;
        let table = CachedCompositionTable::from_config(source, &config.composition);
        let matcher = FoodMatcher::new(config.matcher.clone());
        Ok(Self::new(extractor, table, matcher))
    }

    /// Resolve a meal description into its nutrient breakdown
    ///
    /// Identical trimmed input is served from the cache. Input shorter than
    /// three characters yields an empty result without any service call.
    pub async fn resolve(&self, meal_description: &str) -> Result<MealNutritionResult, ResolveError> {
        let key = meal_description.trim();
        if key.chars().count() < MIN_INPUT_CHARS {
            debug!(input = %key, "Input too short to resolve");
            return Ok(MealNutritionResult::empty());
        }

        if let Some(hit) = lock(&self.cache).get(key) {
            debug!(input = %key, "Resolution cache hit");
            return Ok(hit.clone());
        }

        let (generation, token) = self.begin_request();

        let extraction = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(self.superseded(key)),
            extraction = self.extractor.extract(key) => extraction,
        };

        let table = if extraction.ingredients.is_empty() {
            None
        } else {
            let loaded = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.superseded(key)),
                loaded = self.table.load() => loaded,
            };
            Some(loaded)
        };

        if token.is_cancelled() {
            return Err(self.superseded(key));
        }
        self.finish_request(generation);

        let result = self.assemble(extraction, table);
        if result.is_degraded() {
            warn!(input = %key, "Returning degraded result, not cached");
        } else {
            lock(&self.cache).insert(key.to_string(), result.clone());
        }

        info!(
            input = %key,
            source = ?result.source,
            foods = result.foods.len(),
            found = result.found_count(),
            "Meal resolved"
        );
        Ok(result)
    }

    /// Cancel the previous in-flight request and register a new one
    fn begin_request(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = lock(&self.in_flight).replace(InFlight {
            generation,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            debug!(
                superseded = previous.generation,
                current = generation,
                "Cancelling superseded extraction"
            );
            previous.token.cancel();
        }
        (generation, token)
    }

    fn finish_request(&self, generation: u64) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.as_ref().map(|f| f.generation) == Some(generation) {
            *in_flight = None;
        }
    }

    fn superseded(&self, key: &str) -> ResolveError {
        debug!(input = %key, "Resolution superseded by a newer request");
        ResolveError::Superseded
    }

    fn assemble(
        &self,
        extraction: Extraction,
        table: Option<Result<Arc<CompositionTable>, TableError>>,
    ) -> MealNutritionResult {
        let Extraction {
            ingredients,
            source,
            mut warnings,
        } = extraction;

        let foods: Vec<ResolvedIngredient> = match table {
            None => Vec::new(),
            Some(Ok(table)) => ingredients
                .into_iter()
                .map(|parsed| match self.matcher.best_match(&table, &parsed.name) {
                    Some(best) => {
                        let nutrients = scale(best.record, parsed.quantity);
                        ResolvedIngredient::matched(parsed, best.record, best.score, nutrients)
                    }
                    None => {
                        debug!(name = %parsed.name, "No composition match");
                        ResolvedIngredient::not_found(parsed)
                    }
                })
                .collect(),
            Some(Err(e)) => {
                warn!(error = %e, "Composition table unavailable");
                warnings.push(ResolutionWarning::TableUnavailable {
                    cause: e.to_string(),
                });
                ingredients
                    .into_iter()
                    .map(ResolvedIngredient::not_found)
                    .collect()
            }
        };

        let totals = aggregate(foods.iter().filter_map(|f| f.nutrients.as_ref()));

        MealNutritionResult {
            foods,
            totals,
            source,
            warnings,
            resolved_at: Utc::now(),
        }
    }

    /// Ranked records for an interactive lookup
    ///
    /// Sources with a search of their own narrow the candidates first; the
    /// matcher ranks either way. A failed remote search falls back to the
    /// cached table.
    pub async fn search(&self, query: &str) -> Result<Vec<CompositionRecord>, TableError> {
        let table = match self.table.search(query).await {
            Ok(Some(candidates)) => {
                debug!(query = %query, candidates = candidates.len(), "Source search");
                Arc::new(CompositionTable::new(candidates))
            }
            Ok(None) => self.table.load().await?,
            Err(e) => {
                warn!(query = %query, error = %e, "Source search failed, ranking cached table");
                self.table.load().await?
            }
        };
        Ok(self.matcher.matches(&table, query))
    }

    /// One record by id, fetched from the composition source
    pub async fn record_detail(&self, id: u32) -> Result<Option<CompositionRecord>, TableError> {
        self.table.record(id).await
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    /// Number of cached resolutions
    pub fn cached_entries(&self) -> usize {
        lock(&self.cache).len()
    }

    /// Whether a resolution for this text is cached
    pub fn is_cached(&self, meal_description: &str) -> bool {
        lock(&self.cache).contains_key(meal_description.trim())
    }
}
