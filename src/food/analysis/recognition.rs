use std::sync::Arc;

use super::color::ColorClassifier;
use crate::food::cache::{CachedValue, TtlCache};
use crate::food::image_data::ImageData;
use crate::food::models::AnalysisResult;
use crate::providers::traits::RecognitionProvider;

/// Provider answers at or below this confidence are discarded.
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Ordered provider fallback with a colour-heuristic last resort.
///
/// Providers are consulted one at a time in priority order; the first
/// confident answer wins and the rest are never called.
pub struct RecognitionPipeline {
    providers: Vec<Arc<dyn RecognitionProvider>>,
    classifier: ColorClassifier,
    cache: Arc<TtlCache<CachedValue>>,
}

impl RecognitionPipeline {
    pub fn new(providers: Vec<Arc<dyn RecognitionProvider>>, cache: Arc<TtlCache<CachedValue>>) -> Self {
        Self {
            providers,
            classifier: ColorClassifier::new(),
            cache,
        }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn identify(&self, image: &ImageData) -> AnalysisResult {
        let key = image.cache_key();
        if let Some(CachedValue::Analysis(cached)) = self.cache.get(&key) {
            log::debug!("Using cached identification for {}", key);
            return cached;
        }

        let result = match self.try_providers(image).await {
            Some(result) => result,
            None => {
                log::info!("No provider recognised the image, using colour analysis");
                self.classifier.classify(image)
            }
        };

        self.cache.put(key, CachedValue::Analysis(result.clone()));
        result
    }

    async fn try_providers(&self, image: &ImageData) -> Option<AnalysisResult> {
        for provider in &self.providers {
            match provider.identify(image).await {
                Ok(Some(result)) if result.confidence > ACCEPT_THRESHOLD => {
                    log::info!(
                        "{} identified {} ({:.2})",
                        provider.name(),
                        result.food_name,
                        result.confidence
                    );
                    return Some(result);
                }
                Ok(Some(result)) => {
                    log::debug!(
                        "{} guessed {} with low confidence {:.2}, discarding",
                        provider.name(),
                        result.food_name,
                        result.confidence
                    );
                }
                Ok(None) => log::debug!("{} returned no result", provider.name()),
                Err(e) => log::warn!("{} API failed: {}", provider.name(), e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::cache::DEFAULT_TTL;
    use crate::providers::fake::{Answer, FakeRecognizer};
    use std::time::Duration;

    fn image() -> ImageData {
        ImageData::from_bytes(b"definitely a photo of soup".to_vec()).unwrap()
    }

    fn pipeline(providers: &[Arc<FakeRecognizer>]) -> RecognitionPipeline {
        let providers = providers
            .iter()
            .map(|p| p.clone() as Arc<dyn RecognitionProvider>)
            .collect();
        RecognitionPipeline::new(providers, Arc::new(TtlCache::new(DEFAULT_TTL)))
    }

    #[tokio::test]
    async fn first_provider_wins_and_others_are_skipped() {
        let a = Arc::new(FakeRecognizer::found("A", "Soup", 0.9));
        let b = Arc::new(FakeRecognizer::found("B", "Stew", 0.95));
        let c = Arc::new(FakeRecognizer::found("C", "Broth", 0.99));
        let pipeline = pipeline(&[a.clone(), b.clone(), c.clone()]);

        let result = pipeline.identify(&image()).await;

        assert_eq!(result, AnalysisResult::new("Soup", 0.9));
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 0, 0));
    }

    #[tokio::test]
    async fn failures_and_weak_answers_fall_through() {
        let a = Arc::new(FakeRecognizer::new("A", Answer::Fail));
        let b = Arc::new(FakeRecognizer::found("B", "Stew", 0.4));
        let c = Arc::new(FakeRecognizer::found("C", "Broth", 0.7));
        let pipeline = pipeline(&[a.clone(), b.clone(), c.clone()]);

        let result = pipeline.identify(&image()).await;

        assert_eq!(result.food_name, "Broth");
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn heuristic_answers_when_every_provider_fails() {
        let a = Arc::new(FakeRecognizer::new("A", Answer::Fail));
        let b = Arc::new(FakeRecognizer::new("B", Answer::Nothing));
        let c = Arc::new(FakeRecognizer::new("C", Answer::Fail));
        let pipeline = pipeline(&[a, b, c]);

        // not decodable, so the heuristic reports an unknown food
        let result = pipeline.identify(&image()).await;

        assert!(result.is_unknown());
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[tokio::test]
    async fn repeated_image_is_served_from_cache() {
        let a = Arc::new(FakeRecognizer::found("A", "Soup", 0.9));
        let pipeline = pipeline(&[a.clone()]);

        let first = pipeline.identify(&image()).await;
        let second = pipeline.identify(&image()).await;

        assert_eq!(first, second);
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_trigger_a_new_lookup() {
        let a = Arc::new(FakeRecognizer::found("A", "Soup", 0.9));
        let pipeline = pipeline(&[a.clone()]);

        pipeline.identify(&image()).await;
        tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;
        pipeline.identify(&image()).await;

        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn fallback_results_are_cached_too() {
        let a = Arc::new(FakeRecognizer::new("A", Answer::Fail));
        let pipeline = pipeline(&[a.clone()]);

        pipeline.identify(&image()).await;
        pipeline.identify(&image()).await;

        assert_eq!(a.calls(), 1);
    }
}
