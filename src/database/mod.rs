pub mod history;
pub mod store;

pub use history::{FoodCount, HistoryItem, HistoryStats, HistoryStore, Preferences};
