//! Fake providers for testing.
//!
//! Responses are fixed at construction time and every call is counted, so
//! tests can assert which providers were consulted without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::traits::{FoodDataProvider, RecognitionProvider};
use crate::food::error::{Result, ScanError};
use crate::food::image_data::ImageData;
use crate::food::models::{AnalysisResult, HealthNotes, Note, NutrientMap};

fn unavailable(provider: &str) -> ScanError {
    ScanError::Status {
        status: 503,
        body: format!("{} unavailable", provider),
    }
}

/// What a fake recognizer answers with.
#[derive(Debug, Clone)]
pub enum Answer {
    Found(AnalysisResult),
    Nothing,
    Fail,
}

#[derive(Debug)]
pub struct FakeRecognizer {
    name: String,
    answer: Answer,
    calls: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new(name: &str, answer: Answer) -> Self {
        Self {
            name: name.to_string(),
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn found(name: &str, food: &str, confidence: f64) -> Self {
        Self::new(name, Answer::Found(AnalysisResult::new(food, confidence)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionProvider for FakeRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn identify(&self, _image: &ImageData) -> Result<Option<AnalysisResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Answer::Found(result) => Ok(Some(result.clone())),
            Answer::Nothing => Ok(None),
            Answer::Fail => Err(unavailable(&self.name)),
        }
    }
}

/// Detail source where each lookup either succeeds with a canned value or
/// fails. `None` fields fail.
#[derive(Debug, Default)]
pub struct FakeFoodData {
    pub nutrition: Option<NutrientMap>,
    pub ingredients: Option<Vec<String>>,
    pub health: Option<HealthNotes>,
    pub suggestions: Option<Vec<String>>,
    pub calls: AtomicUsize,
}

impl FakeFoodData {
    pub fn healthy_notes() -> HealthNotes {
        HealthNotes {
            benefits: vec![Note::new("Fresh", "Straight from the garden")],
            warnings: vec![Note::new("Pesticides", "Wash before eating")],
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodDataProvider for FakeFoodData {
    fn name(&self) -> &str {
        "fake"
    }

    async fn nutrition(&self, _food_name: &str) -> Result<NutrientMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.nutrition.clone().ok_or_else(|| unavailable("nutrition"))
    }

    async fn ingredients(&self, _food_name: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ingredients.clone().ok_or_else(|| unavailable("ingredients"))
    }

    async fn health_notes(&self, _food_name: &str) -> Result<HealthNotes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.health.clone().ok_or_else(|| unavailable("health"))
    }

    async fn autocomplete(&self, _query: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.suggestions.clone().ok_or_else(|| unavailable("autocomplete"))
    }
}
