pub mod color;
pub mod details;
pub mod recognition;

pub use color::ColorClassifier;
pub use details::DetailAggregator;
pub use recognition::RecognitionPipeline;
