use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

use crate::food::error::{Result, ScanError};
use crate::food::http::HttpClient;
use crate::food::image_data::ImageData;
use crate::food::models::{AnalysisResult, Nutrient, NutrientMap};
use crate::providers::traits::{FoodDataProvider, RecognitionProvider};

const PROVIDER: &str = "Spoonacular";

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: Option<String>,
    probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct IngredientInformation {
    nutrition: Option<NutritionInfo>,
}

#[derive(Debug, Deserialize)]
struct NutritionInfo {
    #[serde(default)]
    nutrients: Vec<SpoonacularNutrient>,
}

#[derive(Debug, Deserialize)]
struct SpoonacularNutrient {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct AutocompleteItem {
    name: String,
}

#[derive(Debug, Clone)]
pub struct SpoonacularClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

impl SpoonacularClient {
    pub fn new(api_key: String, http: HttpClient) -> Self {
        Self::with_base_url(api_key, "https://api.spoonacular.com".to_string(), http)
    }

    pub fn with_base_url(api_key: String, base_url: String, http: HttpClient) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, label: &str, path: &str, mut query: Vec<(&str, String)>) -> Result<Value> {
        query.push(("apiKey", self.api_key.clone()));
        self.http.get_json(label, &self.url(path), &query).await
    }
}

#[async_trait]
impl RecognitionProvider for SpoonacularClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn identify(&self, image: &ImageData) -> Result<Option<AnalysisResult>> {
        let url = self.url("/food/images/classify");
        let response = self
            .http
            .request_json("Spoonacular image classify", |client| {
                let part = Part::bytes(image.bytes().to_vec())
                    .file_name("food.jpg")
                    .mime_str(image.mime_type())?;
                Ok(client
                    .post(&url)
                    .header("x-api-key", &self.api_key)
                    .multipart(Form::new().part("file", part)))
            })
            .await?;

        parse_classification(response)
    }
}

#[async_trait]
impl FoodDataProvider for SpoonacularClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn nutrition(&self, food_name: &str) -> Result<NutrientMap> {
        let search = self
            .get(
                "Spoonacular ingredient search",
                "/food/ingredients/search",
                vec![("query", food_name.to_string()), ("number", "1".to_string())],
            )
            .await?;
        let search: SearchResponse = serde_json::from_value(search)
            .map_err(|e| ScanError::invalid_response(PROVIDER, e.to_string()))?;

        let Some(hit) = search.results.first() else {
            return Ok(NutrientMap::new());
        };

        let info = self
            .get(
                "Spoonacular ingredient information",
                &format!("/food/ingredients/{}/information", hit.id),
                vec![("amount", "100".to_string()), ("unit", "grams".to_string())],
            )
            .await?;
        let info: IngredientInformation = serde_json::from_value(info)
            .map_err(|e| ScanError::invalid_response(PROVIDER, e.to_string()))?;

        Ok(info
            .nutrition
            .map(|n| parse_nutrients(&n.nutrients))
            .unwrap_or_default())
    }

    async fn ingredients(&self, food_name: &str) -> Result<Vec<String>> {
        let response = self
            .get(
                "Spoonacular product search",
                "/food/products/search",
                vec![("query", food_name.to_string()), ("number", "1".to_string())],
            )
            .await?;
        parse_product_ingredients(&response, food_name)
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<String>> {
        let response = self
            .get(
                "Spoonacular autocomplete",
                "/food/ingredients/autocomplete",
                vec![("query", query.to_string()), ("number", "5".to_string())],
            )
            .await?;
        let items: Vec<AutocompleteItem> = serde_json::from_value(response)
            .map_err(|e| ScanError::invalid_response(PROVIDER, e.to_string()))?;
        Ok(items.into_iter().map(|i| i.name).collect())
    }
}

fn parse_classification(response: Value) -> Result<Option<AnalysisResult>> {
    let response: ClassifyResponse = serde_json::from_value(response)
        .map_err(|e| ScanError::invalid_response(PROVIDER, e.to_string()))?;

    match (response.category, response.probability) {
        (Some(category), Some(probability)) if !category.trim().is_empty() => {
            Ok(Some(AnalysisResult::new(category, probability)))
        }
        _ => Ok(None),
    }
}

fn parse_nutrients(nutrients: &[SpoonacularNutrient]) -> NutrientMap {
    let mut map = NutrientMap::new();
    for nutrient in nutrients {
        let key = match nutrient.name.to_lowercase().as_str() {
            "calories" => Nutrient::Calories,
            "protein" => Nutrient::Protein,
            "carbohydrates" => Nutrient::Carbs,
            "fat" => Nutrient::Fat,
            "fiber" => Nutrient::Fiber,
            "sugar" => Nutrient::Sugar,
            "sodium" => Nutrient::Sodium,
            "potassium" => Nutrient::Potassium,
            _ => continue,
        };
        map.insert(key, nutrient.amount);
    }
    map
}

/// A matched product yields its ingredient list; no match means a whole
/// food, which is its own single ingredient.
fn parse_product_ingredients(response: &Value, food_name: &str) -> Result<Vec<String>> {
    let products = response
        .get("products")
        .and_then(|p| p.as_array())
        .ok_or_else(|| ScanError::invalid_response(PROVIDER, "missing products array"))?;

    let Some(product) = products.first() else {
        return Ok(vec![food_name.to_string()]);
    };

    let ingredients = product
        .get("ingredients")
        .and_then(|i| i.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("name").and_then(|n| n.as_str()).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ingredients)
}
