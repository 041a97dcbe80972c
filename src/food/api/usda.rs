use async_trait::async_trait;
use serde_json::Value;

use crate::food::error::Result;
use crate::food::http::HttpClient;
use crate::food::models::{Nutrient, NutrientMap};
use crate::providers::traits::FoodDataProvider;

// FoodData Central nutrient names for the tracked keys
const NUTRIENT_NAMES: &[(&str, Nutrient)] = &[
    ("Energy", Nutrient::Calories),
    ("Protein", Nutrient::Protein),
    ("Carbohydrate, by difference", Nutrient::Carbs),
    ("Total lipid (fat)", Nutrient::Fat),
    ("Fiber, total dietary", Nutrient::Fiber),
    ("Sugars, total including NLEA", Nutrient::Sugar),
    ("Sodium, Na", Nutrient::Sodium),
    ("Potassium, K", Nutrient::Potassium),
];

#[derive(Debug, Clone)]
pub struct UsdaClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

impl UsdaClient {
    pub fn new(api_key: String, http: HttpClient) -> Self {
        Self::with_base_url(api_key, "https://api.nal.usda.gov/fdc/v1".to_string(), http)
    }

    pub fn with_base_url(api_key: String, base_url: String, http: HttpClient) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Best-matching FoodData Central entry across the survey, foundation
    /// and legacy datasets. Fails only when every dataset search failed.
    async fn search_single_food(&self, query: &str) -> Result<Option<Value>> {
        let url = format!("{}/foods/search", self.base_url);

        // Try different data types to get better results
        let data_types = ["Survey (FNDDS)", "Foundation", "SR Legacy"];
        let mut best_match: Option<(f64, Value)> = None;
        let mut last_error = None;
        let mut answered = false;

        for data_type in data_types.iter() {
            let params = [
                ("api_key", self.api_key.clone()),
                ("query", query.to_string()),
                ("dataType", data_type.to_string()),
                ("pageSize", "10".to_string()),
            ];
            let data = match self.http.get_json("USDA food search", &url, &params).await {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("USDA search in {} failed: {}", data_type, e);
                    last_error = Some(e);
                    continue;
                }
            };
            answered = true;

            let Some(foods) = data.get("foods").and_then(|f| f.as_array()) else {
                continue;
            };
            for food in foods {
                if let Some(description) = food.get("description").and_then(|d| d.as_str()) {
                    let score = string_similarity(description, query);
                    let is_better_match = match &best_match {
                        None => true,
                        Some((best_score, _)) => score > *best_score,
                    };
                    if is_better_match {
                        best_match = Some((score, food.clone()));
                    }
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(best_match.map(|(_, food)| food)),
        }
    }
}

#[async_trait]
impl FoodDataProvider for UsdaClient {
    fn name(&self) -> &str {
        "USDA FoodData Central"
    }

    async fn nutrition(&self, food_name: &str) -> Result<NutrientMap> {
        Ok(self
            .search_single_food(food_name)
            .await?
            .map(|food| parse_food_nutrients(&food))
            .unwrap_or_default())
    }
}

fn parse_food_nutrients(food: &Value) -> NutrientMap {
    let mut map = NutrientMap::new();
    let Some(nutrients) = food.get("foodNutrients").and_then(|n| n.as_array()) else {
        return map;
    };

    for nutrient in nutrients {
        let (Some(name), Some(value)) = (
            nutrient.get("nutrientName").and_then(|n| n.as_str()),
            nutrient.get("value").and_then(|v| v.as_f64()),
        ) else {
            continue;
        };
        let Some((_, key)) = NUTRIENT_NAMES.iter().find(|(n, _)| *n == name) else {
            continue;
        };
        // Energy is listed in both kcal and kJ
        if *key == Nutrient::Calories {
            let unit = nutrient.get("unitName").and_then(|u| u.as_str()).unwrap_or("KCAL");
            if !unit.eq_ignore_ascii_case("kcal") {
                continue;
            }
        }
        map.entry(*key).or_insert(value);
    }
    map
}

fn string_similarity(s1: &str, s2: &str) -> f64 {
    let s1_lower = s1.to_lowercase();
    let s2_lower = s2.to_lowercase();

    let s1_words: Vec<&str> = s1_lower.split_whitespace().collect();
    let s2_words: Vec<&str> = s2_lower.split_whitespace().collect();

    let longest = s1_words.len().max(s2_words.len());
    if longest == 0 {
        return 0.0;
    }

    let matches = s1_words.iter().filter(|w| s2_words.contains(w)).count();

    matches as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::http::RetryPolicy;
    use serde_json::json;

    #[tokio::test]
    async fn nutrition_fails_when_every_search_fails() {
        // nothing listens on a port freed right after binding
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let http = HttpClient::new(RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        });
        let usda = UsdaClient::with_base_url("key".to_string(), base_url, http);

        assert!(usda.nutrition("banana").await.is_err());
    }

    #[test]
    fn maps_usda_nutrient_names() {
        let food = json!({
            "description": "Bananas, raw",
            "foodNutrients": [
                {"nutrientName": "Energy", "value": 371.0, "unitName": "kJ"},
                {"nutrientName": "Energy", "value": 89.0, "unitName": "KCAL"},
                {"nutrientName": "Potassium, K", "value": 358.0, "unitName": "MG"},
                {"nutrientName": "Carbohydrate, by difference", "value": 22.8, "unitName": "G"},
                {"nutrientName": "Vitamin B-6", "value": 0.4, "unitName": "MG"}
            ]
        });
        let map = parse_food_nutrients(&food);
        assert_eq!(map.get(&Nutrient::Calories), Some(&89.0));
        assert_eq!(map.get(&Nutrient::Potassium), Some(&358.0));
        assert_eq!(map.get(&Nutrient::Carbs), Some(&22.8));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn similarity_counts_shared_words() {
        assert_eq!(string_similarity("Bananas, raw", "banana"), 0.0);
        assert_eq!(string_similarity("banana raw", "banana"), 0.5);
        assert_eq!(string_similarity("", ""), 0.0);
    }
}
