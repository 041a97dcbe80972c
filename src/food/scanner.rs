use std::sync::Arc;
use std::time::Duration;

use super::analysis::{DetailAggregator, RecognitionPipeline};
use super::api::{LogMealClient, LogMealShape, SpoonacularClient, UsdaClient};
use super::cache::{search_key, CachedValue, TtlCache};
use super::config::FoodConfig;
use super::error::{Result, ScanError};
use super::http::HttpClient;
use super::image_data::ImageData;
use super::models::{AnalysisResult, FoodRecord, FoodScan, Suggestion};
use crate::config::ScannerConfig;
use crate::providers::traits::{FoodDataProvider, RecognitionProvider};

/// Entry point of the library: owns the cache and every provider.
pub struct FoodScanner {
    recognition: RecognitionPipeline,
    details: DetailAggregator,
    cache: Arc<TtlCache<CachedValue>>,
}

impl FoodScanner {
    /// Wire up the providers whose API keys are present. Recognition order
    /// is Spoonacular, LogMeal, LogMeal predictions; detail lookups go to
    /// Spoonacular then USDA.
    pub fn new(config: &ScannerConfig, keys: &FoodConfig) -> Self {
        let http = HttpClient::new(config.retry.clone());
        let mut recognizers: Vec<Arc<dyn RecognitionProvider>> = Vec::new();
        let mut sources: Vec<Arc<dyn FoodDataProvider>> = Vec::new();

        if let Some(key) = &keys.spoonacular_api_key {
            let client = Arc::new(match &config.spoonacular_url {
                Some(url) => SpoonacularClient::with_base_url(key.clone(), url.clone(), http.clone()),
                None => SpoonacularClient::new(key.clone(), http.clone()),
            });
            recognizers.push(client.clone());
            sources.push(client);
        }

        if let Some(key) = &keys.logmeal_api_key {
            for shape in [LogMealShape::RecognitionResults, LogMealShape::Predictions] {
                let client = match &config.logmeal_url {
                    Some(url) => LogMealClient::with_url(key.clone(), url.clone(), shape, http.clone()),
                    None => LogMealClient::new(key.clone(), shape, http.clone()),
                };
                recognizers.push(Arc::new(client));
            }
        }

        if let Some(key) = &keys.usda_api_key {
            let client = match &config.usda_url {
                Some(url) => UsdaClient::with_base_url(key.clone(), url.clone(), http.clone()),
                None => UsdaClient::new(key.clone(), http.clone()),
            };
            sources.push(Arc::new(client));
        }

        if recognizers.is_empty() {
            log::warn!("No recognition provider configured, only colour analysis is available");
        }

        Self::with_providers(recognizers, sources, config.cache_ttl, config.static_fallback)
    }

    pub fn with_providers(
        recognizers: Vec<Arc<dyn RecognitionProvider>>,
        sources: Vec<Arc<dyn FoodDataProvider>>,
        cache_ttl: Duration,
        static_fallback: bool,
    ) -> Self {
        let cache = Arc::new(TtlCache::new(cache_ttl));
        Self {
            recognition: RecognitionPipeline::new(recognizers, cache.clone()),
            details: DetailAggregator::new(sources, static_fallback),
            cache,
        }
    }

    pub fn recognizer_names(&self) -> Vec<&str> {
        self.recognition.provider_names()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.details.source_names()
    }

    pub async fn identify(&self, image: &ImageData) -> AnalysisResult {
        self.recognition.identify(image).await
    }

    pub async fn get_details(&self, food_name: &str) -> FoodRecord {
        self.details.get_details(food_name).await
    }

    /// Identify the food in `image` and gather its details.
    pub async fn analyze_image(&self, image: &ImageData) -> FoodScan {
        let analysis = self.identify(image).await;
        let record = self.get_details(&analysis.food_name).await;
        FoodScan {
            confidence: analysis.confidence,
            record,
        }
    }

    pub async fn search_food(&self, query: &str) -> Result<FoodRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScanError::EmptyQuery);
        }

        let key = search_key(query);
        if let Some(CachedValue::Food(record)) = self.cache.get(&key) {
            log::debug!("Using cached search result for {}", query);
            return Ok(record);
        }

        let record = self.get_details(query).await;
        self.cache.put(key, CachedValue::Food(record.clone()));
        Ok(record)
    }

    pub async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        self.details.suggestions(query).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        log::info!("Food scanner cache cleared");
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
