use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{read_json, write_json};
use crate::food::error::{Result, ScanError};
use crate::food::image_data::ImageData;
use crate::food::models::{FoodScan, Note, NutrientMap};

pub const MAX_HISTORY_ITEMS: usize = 100;
pub const RETENTION_DAYS: i64 = 365;
const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub nutrition: NutrientMap,
    #[serde(default)]
    pub benefits: Vec<Note>,
    #[serde(default)]
    pub warnings: Vec<Note>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub imported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_date: Option<DateTime<Utc>>,
}

impl HistoryItem {
    fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
            || self
                .ingredients
                .iter()
                .any(|ingredient| ingredient.to_lowercase().contains(term))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: String,
    pub save_images: bool,
    pub notifications_enabled: bool,
    pub auto_save: bool,
    pub daily_calorie_goal: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            save_images: true,
            notifications_enabled: true,
            auto_save: true,
            daily_calorie_goal: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct HistoryData {
    history: Vec<HistoryItem>,
    preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub top_foods: Vec<FoodCount>,
    pub recent_scans: Vec<HistoryItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    history: &'a [HistoryItem],
    preferences: &'a Preferences,
    export_date: DateTime<Utc>,
    version: &'static str,
}

/// Scan history and user preferences kept in a single JSON file.
///
/// Every mutation is written back before it returns. Items are stored newest
/// first and capped at [`MAX_HISTORY_ITEMS`].
pub struct HistoryStore {
    path: PathBuf,
    data: Mutex<HistoryData>,
}

impl HistoryStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match read_json::<HistoryData>(&path).await? {
            Some(data) => {
                log::info!("Loaded {} history items from {}", data.history.len(), path.display());
                data
            }
            None => HistoryData::default(),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a scan and return its new id. The image is only kept when the
    /// `save_images` preference is on.
    pub async fn save(&self, scan: &FoodScan, image: Option<&ImageData>, now: DateTime<Utc>) -> Result<String> {
        let mut data = self.data.lock().await;
        let image_data = if data.preferences.save_images {
            image.map(ImageData::to_data_url)
        } else {
            None
        };

        let item = HistoryItem {
            id: Uuid::new_v4().to_string(),
            name: scan.record.name.clone(),
            timestamp: now,
            image_data,
            ingredients: scan.record.ingredients.clone(),
            nutrition: scan.record.nutrition.clone(),
            benefits: scan.record.benefits.clone(),
            warnings: scan.record.warnings.clone(),
            confidence: scan.confidence,
            imported: false,
            import_date: None,
        };
        let id = item.id.clone();

        let mut updated = data.clone();
        updated.history.insert(0, item);
        updated.history.truncate(MAX_HISTORY_ITEMS);
        self.commit(&mut data, updated).await?;

        log::debug!("Saved {} to history as {}", scan.record.name, id);
        Ok(id)
    }

    pub async fn items(&self) -> Vec<HistoryItem> {
        self.data.lock().await.history.clone()
    }

    pub async fn get(&self, id: &str) -> Option<HistoryItem> {
        self.data
            .lock()
            .await
            .history
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// `false` when no item has this id.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated.history.retain(|item| item.id != id);
        if updated.history.len() == data.history.len() {
            return Ok(false);
        }
        self.commit(&mut data, updated).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<()> {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated.history.clear();
        self.commit(&mut data, updated).await
    }

    /// Case-insensitive match on the name or any ingredient.
    pub async fn search(&self, query: &str) -> Vec<HistoryItem> {
        let term = query.trim().to_lowercase();
        self.data
            .lock()
            .await
            .history
            .iter()
            .filter(|item| item.matches(&term))
            .cloned()
            .collect()
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> HistoryStats {
        let data = self.data.lock().await;
        let history = &data.history;
        let since = |window: Duration| history.iter().filter(|item| item.timestamp > now - window).count();

        HistoryStats {
            total: history.len(),
            today: since(Duration::days(1)),
            this_week: since(Duration::days(7)),
            this_month: since(Duration::days(30)),
            top_foods: top_foods(history),
            recent_scans: history.iter().take(5).cloned().collect(),
        }
    }

    pub async fn preferences(&self) -> Preferences {
        self.data.lock().await.preferences.clone()
    }

    pub async fn set_preferences(&self, preferences: Preferences) -> Result<()> {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated.preferences = preferences;
        self.commit(&mut data, updated).await
    }

    pub async fn export(&self, now: DateTime<Utc>) -> Result<String> {
        let data = self.data.lock().await;
        let document = ExportDocument {
            history: &data.history,
            preferences: &data.preferences,
            export_date: now,
            version: EXPORT_VERSION,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Replace the history with the exported one and merge its preferences
    /// over the current ones. Nothing changes when the document is invalid
    /// or cannot be saved.
    pub async fn import(&self, json: &str, now: DateTime<Utc>) -> Result<usize> {
        let document: Value = serde_json::from_str(json)?;
        let items = document
            .get("history")
            .and_then(Value::as_array)
            .ok_or_else(|| ScanError::InvalidImport("missing or invalid history".to_string()))?;

        let mut history = Vec::with_capacity(items.len());
        for item in items {
            let mut item: HistoryItem = serde_json::from_value(item.clone())?;
            if item.id.is_empty() {
                item.id = Uuid::new_v4().to_string();
            }
            item.imported = true;
            item.import_date = Some(now);
            history.push(item);
        }

        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated.history = history;
        if let Some(Value::Object(incoming)) = document.get("preferences") {
            updated.preferences = merge_preferences(&data.preferences, incoming)?;
        }

        let count = updated.history.len();
        self.commit(&mut data, updated).await?;
        log::info!("Imported {} history items", count);
        Ok(count)
    }

    /// Drop items older than [`RETENTION_DAYS`], returning how many went.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(RETENTION_DAYS);
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        updated.history.retain(|item| item.timestamp > cutoff);

        let removed = data.history.len() - updated.history.len();
        if removed > 0 {
            self.commit(&mut data, updated).await?;
            log::info!("Cleaned up {} old history items", removed);
        }
        Ok(removed)
    }

    /// Persist `updated` and only then make it the in-memory state.
    async fn commit(&self, current: &mut HistoryData, updated: HistoryData) -> Result<()> {
        if let Err(e) = write_json(&self.path, &updated).await {
            log::error!("Failed to save history to {}: {}", self.path.display(), e);
            return Err(e);
        }
        *current = updated;
        Ok(())
    }
}

fn merge_preferences(current: &Preferences, incoming: &serde_json::Map<String, Value>) -> Result<Preferences> {
    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in incoming {
            fields.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(merged)?)
}

/// Most frequent names, ties in order of first appearance.
fn top_foods(history: &[HistoryItem]) -> Vec<FoodCount> {
    let mut counts: Vec<FoodCount> = Vec::new();
    for item in history {
        match counts.iter_mut().find(|c| c.name == item.name) {
            Some(entry) => entry.count += 1,
            None => counts.push(FoodCount {
                name: item.name.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(5);
    counts
}
