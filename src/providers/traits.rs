use async_trait::async_trait;

use crate::food::error::{Result, ScanError};
use crate::food::image_data::ImageData;
use crate::food::models::{AnalysisResult, HealthNotes, NutrientMap};

/// An external service that can name the food in a photo.
///
/// `Ok(None)` means the service answered but recognised nothing. Errors and
/// `None` are treated the same way by the recognition pipeline.
#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn identify(&self, image: &ImageData) -> Result<Option<AnalysisResult>>;
}

/// An external service queried by food name for details.
///
/// Only nutrition is mandatory; the other lookups default to
/// [`ScanError::Unsupported`] so the caller moves on to the next source.
#[async_trait]
pub trait FoodDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn nutrition(&self, food_name: &str) -> Result<NutrientMap>;

    async fn ingredients(&self, _food_name: &str) -> Result<Vec<String>> {
        Err(ScanError::Unsupported("ingredient lookup"))
    }

    async fn health_notes(&self, _food_name: &str) -> Result<HealthNotes> {
        Err(ScanError::Unsupported("health notes"))
    }

    async fn autocomplete(&self, _query: &str) -> Result<Vec<String>> {
        Err(ScanError::Unsupported("autocomplete"))
    }
}
