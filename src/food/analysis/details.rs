use std::sync::Arc;

use crate::food::error::{Result, ScanError};
use crate::food::knowledge;
use crate::food::models::{FoodRecord, HealthNotes, NutrientMap, Suggestion};
use crate::providers::traits::FoodDataProvider;

const MIN_SUGGESTION_QUERY: usize = 2;
const MAX_SUGGESTIONS: usize = 5;

/// Gathers nutrition, ingredients and health notes for a named food.
///
/// The three lookups run concurrently and settle independently: a failing
/// lookup leaves its fields empty without affecting the others. Each lookup
/// walks the live sources in order and, when enabled, ends at the embedded
/// tables in [`knowledge`].
pub struct DetailAggregator {
    sources: Vec<Arc<dyn FoodDataProvider>>,
    static_fallback: bool,
}

impl DetailAggregator {
    pub fn new(sources: Vec<Arc<dyn FoodDataProvider>>, static_fallback: bool) -> Self {
        Self {
            sources,
            static_fallback,
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn get_details(&self, food_name: &str) -> FoodRecord {
        let (nutrition, ingredients, health) = futures::join!(
            self.nutrition(food_name),
            self.ingredients(food_name),
            self.health_notes(food_name)
        );

        let health = settle("health", food_name, health);
        FoodRecord {
            name: food_name.to_string(),
            nutrition: settle("nutrition", food_name, nutrition),
            ingredients: settle("ingredients", food_name, ingredients),
            benefits: health.benefits,
            warnings: health.warnings,
        }
    }

    pub async fn nutrition(&self, food_name: &str) -> Result<NutrientMap> {
        let mut last_error = None;
        for source in &self.sources {
            match source.nutrition(food_name).await {
                Ok(nutrition) if !nutrition.is_empty() => return Ok(nutrition),
                Ok(_) => log::debug!("{} has no nutrition data for {}", source.name(), food_name),
                Err(e) => last_error = Some(report(source.name(), "nutrition", e)),
            }
        }
        self.fall_back(last_error, NutrientMap::new(), || {
            knowledge::fallback_nutrition(food_name)
        })
    }

    pub async fn ingredients(&self, food_name: &str) -> Result<Vec<String>> {
        let mut last_error = None;
        for source in &self.sources {
            match source.ingredients(food_name).await {
                Ok(ingredients) => return Ok(ingredients),
                Err(e) => last_error = report_unless_unsupported(source.name(), "ingredients", e, last_error),
            }
        }
        self.fall_back(last_error, Vec::new(), || knowledge::fallback_ingredients(food_name))
    }

    /// Health notes always have an answer: the knowledge base is the
    /// primary source and covers unknown foods with generic notes.
    pub async fn health_notes(&self, food_name: &str) -> Result<HealthNotes> {
        for source in &self.sources {
            match source.health_notes(food_name).await {
                Ok(notes) => return Ok(notes),
                Err(e) => {
                    report_unless_unsupported(source.name(), "health notes", e, None);
                }
            }
        }
        Ok(knowledge::health_notes(food_name))
    }

    pub async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGESTION_QUERY {
            return Vec::new();
        }

        for source in &self.sources {
            match source.autocomplete(query).await {
                Ok(names) => {
                    return names
                        .into_iter()
                        .take(MAX_SUGGESTIONS)
                        .map(Suggestion::new)
                        .collect()
                }
                Err(e) => {
                    report_unless_unsupported(source.name(), "autocomplete", e, None);
                }
            }
        }
        knowledge::fallback_suggestions(query)
    }

    /// `empty` is returned when no source failed but none had data and the
    /// static tables are disabled.
    fn fall_back<T>(&self, last_error: Option<ScanError>, empty: T, table: impl FnOnce() -> T) -> Result<T> {
        if self.static_fallback {
            return Ok(table());
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(empty),
        }
    }
}

fn report(source: &str, lookup: &str, error: ScanError) -> ScanError {
    log::warn!("{} {} lookup failed: {}", source, lookup, error);
    error
}

fn report_unless_unsupported(
    source: &str,
    lookup: &str,
    error: ScanError,
    previous: Option<ScanError>,
) -> Option<ScanError> {
    if let ScanError::Unsupported(_) = error {
        log::debug!("{} does not support {}", source, lookup);
        return previous;
    }
    Some(report(source, lookup, error))
}

fn settle<T: Default>(field: &str, food_name: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("No {} for {}: {}", field, food_name, e);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::models::Nutrient;
    use crate::providers::fake::FakeFoodData;

    fn aggregator(source: FakeFoodData, static_fallback: bool) -> (Arc<FakeFoodData>, DetailAggregator) {
        let source = Arc::new(source);
        let aggregator = DetailAggregator::new(vec![source.clone() as Arc<dyn FoodDataProvider>], static_fallback);
        (source, aggregator)
    }

    fn protein(amount: f64) -> NutrientMap {
        NutrientMap::from([(Nutrient::Protein, amount)])
    }

    #[tokio::test]
    async fn failed_nutrition_leaves_other_fields_intact() {
        let (_, aggregator) = aggregator(
            FakeFoodData {
                ingredients: Some(vec!["Tofu".to_string()]),
                health: Some(FakeFoodData::healthy_notes()),
                ..Default::default()
            },
            false,
        );

        let record = aggregator.get_details("Tofu").await;

        assert_eq!(record.name, "Tofu");
        assert!(record.nutrition.is_empty());
        assert_eq!(record.ingredients, vec!["Tofu"]);
        assert_eq!(record.benefits, FakeFoodData::healthy_notes().benefits);
        assert_eq!(record.warnings, FakeFoodData::healthy_notes().warnings);
    }

    #[tokio::test]
    async fn live_data_takes_precedence_over_tables() {
        let (_, aggregator) = aggregator(
            FakeFoodData {
                nutrition: Some(protein(12.5)),
                ingredients: Some(vec!["Banana".to_string()]),
                ..Default::default()
            },
            true,
        );

        let record = aggregator.get_details("banana").await;

        assert_eq!(record.nutrition, protein(12.5));
        assert_eq!(record.ingredients, vec!["Banana"]);
        // the fake has no health notes, so the knowledge base answers
        assert_eq!(record.benefits[0].title, "Potassium Rich");
    }

    #[tokio::test]
    async fn static_tables_cover_failing_sources() {
        let (_, aggregator) = aggregator(FakeFoodData::default(), true);

        let record = aggregator.get_details("Banana").await;

        assert_eq!(record.nutrition.get(&Nutrient::Calories), Some(&89.0));
        assert_eq!(record.ingredients, vec!["Banana"]);
        assert_eq!(record.warnings[0].title, "High Sugar Content");
    }

    #[tokio::test]
    async fn empty_live_nutrition_moves_to_next_source() {
        let empty = Arc::new(FakeFoodData {
            nutrition: Some(NutrientMap::new()),
            ..Default::default()
        });
        let full = Arc::new(FakeFoodData {
            nutrition: Some(protein(3.0)),
            ..Default::default()
        });
        let aggregator = DetailAggregator::new(
            vec![
                empty.clone() as Arc<dyn FoodDataProvider>,
                full.clone() as Arc<dyn FoodDataProvider>,
            ],
            false,
        );

        assert_eq!(aggregator.nutrition("lentils").await.unwrap(), protein(3.0));
        assert_eq!(empty.calls(), 1);
        assert_eq!(full.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_fallback_surfaces_the_failure() {
        let (_, aggregator) = aggregator(FakeFoodData::default(), false);

        assert!(aggregator.nutrition("apple").await.is_err());
        assert!(aggregator.ingredients("apple").await.is_err());
        let record = aggregator.get_details("apple").await;
        assert!(record.nutrition.is_empty());
        assert!(record.ingredients.is_empty());
    }

    #[tokio::test]
    async fn suggestions_need_two_characters() {
        let (source, aggregator) = aggregator(
            FakeFoodData {
                suggestions: Some(vec!["apple".to_string()]),
                ..Default::default()
            },
            true,
        );

        assert!(aggregator.suggestions("a").await.is_empty());
        assert_eq!(source.calls(), 0);
        let names: Vec<String> = aggregator.suggestions("ap").await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["apple"]);
    }

    #[tokio::test]
    async fn suggestions_fall_back_to_common_foods() {
        let (_, aggregator) = aggregator(FakeFoodData::default(), true);

        let suggestions = aggregator.suggestions("ch").await;

        let names: Vec<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken", "Sandwich", "Cheese"]);
        assert_eq!(suggestions[0].description, "Click to view nutritional information");
    }
}
