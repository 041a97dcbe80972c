use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

use crate::food::error::{Result, ScanError};
use crate::food::http::HttpClient;
use crate::food::image_data::ImageData;
use crate::food::models::AnalysisResult;
use crate::providers::traits::RecognitionProvider;

/// LogMeal answers the same endpoint with one of two layouts depending on
/// the plan and API version, so each gets its own provider slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMealShape {
    /// `{ "recognition_results": [{ "name", "prob" | "confidence" }] }`
    RecognitionResults,
    /// `{ "predictions": [{ "name", "confidence" }] }`
    Predictions,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    name: Option<String>,
    confidence: Option<f64>,
    prob: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct LogMealClient {
    api_key: String,
    url: String,
    shape: LogMealShape,
    http: HttpClient,
}

impl LogMealClient {
    pub fn new(api_key: String, shape: LogMealShape, http: HttpClient) -> Self {
        Self::with_url(
            api_key,
            "https://api.logmeal.es/v2/image/foodrecognition".to_string(),
            shape,
            http,
        )
    }

    pub fn with_url(api_key: String, url: String, shape: LogMealShape, http: HttpClient) -> Self {
        Self {
            api_key,
            url,
            shape,
            http,
        }
    }
}

#[async_trait]
impl RecognitionProvider for LogMealClient {
    fn name(&self) -> &str {
        match self.shape {
            LogMealShape::RecognitionResults => "LogMeal",
            LogMealShape::Predictions => "LogMeal (predictions)",
        }
    }

    async fn identify(&self, image: &ImageData) -> Result<Option<AnalysisResult>> {
        let label = format!("{} recognition", self.name());
        let response = self
            .http
            .request_json(&label, |client| {
                let part = Part::bytes(image.bytes().to_vec())
                    .file_name("food.jpg")
                    .mime_str(image.mime_type())?;
                Ok(client
                    .post(&self.url)
                    .bearer_auth(&self.api_key)
                    .multipart(Form::new().part("image", part)))
            })
            .await?;

        parse_candidates(&response, self.shape)
    }
}

fn parse_candidates(response: &Value, shape: LogMealShape) -> Result<Option<AnalysisResult>> {
    let field = match shape {
        LogMealShape::RecognitionResults => "recognition_results",
        LogMealShape::Predictions => "predictions",
    };

    let Some(candidates) = response.get(field).and_then(|c| c.as_array()) else {
        return Ok(None);
    };
    let Some(top) = candidates.first() else {
        return Ok(None);
    };

    let top: Candidate = serde_json::from_value(top.clone())
        .map_err(|e| ScanError::invalid_response("LogMeal", e.to_string()))?;

    match (top.name, top.confidence.or(top.prob)) {
        (Some(name), Some(confidence)) if !name.trim().is_empty() => {
            Ok(Some(AnalysisResult::new(name, confidence)))
        }
        _ => Err(ScanError::invalid_response(
            "LogMeal",
            format!("top {} entry lacks name or confidence", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_recognition_results_with_prob() {
        let response = json!({"recognition_results": [
            {"name": "ramen", "prob": 0.81},
            {"name": "udon", "prob": 0.1}
        ]});
        let result = parse_candidates(&response, LogMealShape::RecognitionResults)
            .unwrap()
            .unwrap();
        assert_eq!(result, AnalysisResult::new("ramen", 0.81));
    }

    #[test]
    fn confidence_wins_over_prob_when_both_present() {
        let response = json!({"recognition_results": [
            {"name": "pho", "prob": 0.4, "confidence": 0.77}
        ]});
        let result = parse_candidates(&response, LogMealShape::RecognitionResults)
            .unwrap()
            .unwrap();
        assert_eq!(result, AnalysisResult::new("pho", 0.77));
    }

    #[test]
    fn reads_predictions_shape() {
        let response = json!({"predictions": [{"name": "salad", "confidence": 0.66}]});
        let result = parse_candidates(&response, LogMealShape::Predictions)
            .unwrap()
            .unwrap();
        assert_eq!(result.food_name, "salad");

        // other shape is ignored
        assert!(parse_candidates(&response, LogMealShape::RecognitionResults)
            .unwrap()
            .is_none());
    }

    #[test]
    fn empty_or_broken_candidates() {
        let empty = json!({"predictions": []});
        assert!(parse_candidates(&empty, LogMealShape::Predictions).unwrap().is_none());

        let nameless = json!({"predictions": [{"confidence": 0.9}]});
        assert!(parse_candidates(&nameless, LogMealShape::Predictions).is_err());
    }
}
