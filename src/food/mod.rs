pub mod analysis;
pub mod api;
pub mod cache;
pub mod calories;
pub mod config;
pub mod error;
pub mod http;
pub mod image_data;
pub mod knowledge;
pub mod models;
pub mod scanner;

pub use error::{Result, ScanError};
pub use image_data::ImageData;
pub use models::{AnalysisResult, FoodRecord, FoodScan, Note, Nutrient, NutrientMap, Suggestion};
pub use scanner::FoodScanner;
