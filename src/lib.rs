pub mod commands;
pub mod config;
pub mod database;
pub mod food;
pub mod providers;

// Re-export commonly used items
pub use config::ScannerConfig;
pub use food::{FoodScanner, ImageData, ScanError};
