pub mod logmeal;
pub mod spoonacular;
pub mod usda;

// Re-export common types
pub use logmeal::{LogMealClient, LogMealShape};
pub use spoonacular::SpoonacularClient;
pub use usda::UsdaClient;
