pub mod traits;

#[cfg(test)]
pub mod fake;

pub use traits::{FoodDataProvider, RecognitionProvider};
