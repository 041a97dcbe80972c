use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::{Result, ScanError};
use crate::database::store::{read_json, write_json};

pub const DEFAULT_GOAL: u32 = 2000;
pub const MIN_GOAL: u32 = 1000;
pub const MAX_GOAL: u32 = 5000;
pub const MAX_SERVINGS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalorieInfo {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub serving: &'static str,
}

const fn info(calories: f64, protein: f64, carbs: f64, fat: f64, serving: &'static str) -> CalorieInfo {
    CalorieInfo {
        calories,
        protein,
        carbs,
        fat,
        serving,
    }
}

/// Per-serving values for the foods that can be logged.
pub const FOOD_DATABASE: &[(&str, CalorieInfo)] = &[
    ("apple", info(95.0, 0.5, 25.0, 0.3, "1 medium")),
    ("banana", info(105.0, 1.3, 27.0, 0.4, "1 medium")),
    ("orange", info(62.0, 1.2, 15.4, 0.2, "1 medium")),
    ("chicken breast", info(165.0, 31.0, 0.0, 3.6, "100g")),
    ("salmon", info(208.0, 22.0, 0.0, 12.0, "100g")),
    ("rice", info(130.0, 2.7, 28.0, 0.3, "100g cooked")),
    ("broccoli", info(34.0, 2.8, 7.0, 0.4, "100g")),
    ("spinach", info(23.0, 2.9, 3.6, 0.4, "100g")),
    ("avocado", info(160.0, 2.0, 9.0, 15.0, "100g")),
    ("bread", info(265.0, 9.0, 49.0, 3.2, "100g")),
    ("pasta", info(131.0, 5.0, 25.0, 1.1, "100g cooked")),
    ("egg", info(155.0, 13.0, 1.1, 11.0, "100g")),
    ("milk", info(42.0, 3.4, 5.0, 1.0, "100ml")),
    ("yogurt", info(59.0, 10.0, 3.6, 0.4, "100g")),
    ("almonds", info(579.0, 21.0, 22.0, 50.0, "100g")),
    ("oatmeal", info(68.0, 2.4, 12.0, 1.4, "100g cooked")),
    ("sweet potato", info(86.0, 1.6, 20.0, 0.1, "100g")),
    ("tomato", info(18.0, 0.9, 3.9, 0.2, "100g")),
    ("cucumber", info(16.0, 0.7, 4.0, 0.1, "100g")),
    ("carrots", info(41.0, 0.9, 10.0, 0.2, "100g")),
    ("strawberries", info(32.0, 0.7, 8.0, 0.3, "100g")),
    ("blueberries", info(57.0, 0.7, 14.0, 0.3, "100g")),
    ("quinoa", info(120.0, 4.4, 22.0, 1.9, "100g cooked")),
    ("tuna", info(144.0, 30.0, 0.0, 1.0, "100g")),
    ("cheese", info(113.0, 7.0, 1.0, 9.0, "30g slice")),
];

pub fn lookup(food: &str) -> Option<CalorieInfo> {
    let key = food.trim().to_lowercase();
    FOOD_DATABASE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, info)| *info)
}

/// Foods whose name contains the query or is contained in it.
pub fn find_foods(query: &str) -> Vec<(&'static str, CalorieInfo)> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    FOOD_DATABASE
        .iter()
        .filter(|(name, _)| name.contains(query.as_str()) || query.contains(name))
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl Meal {
    pub const ALL: [Meal; 4] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner, Meal::Snacks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Snacks => "snacks",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Meal {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "dinner" => Ok(Meal::Dinner),
            "snack" | "snacks" => Ok(Meal::Snacks),
            other => Err(ScanError::UnknownMeal(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Very,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Very => 1.725,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "very" => Ok(ActivityLevel::Very),
            other => Err(ScanError::UnknownActivity(other.to_string())),
        }
    }
}

pub fn recommended_calories(activity: ActivityLevel) -> u32 {
    (DEFAULT_GOAL as f64 * activity.multiplier()).round() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub name: String,
    pub servings: f64,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyLog {
    date: NaiveDate,
    consumed: u32,
    macros: Macros,
    food_log: BTreeMap<Meal, Vec<LogEntry>>,
    daily_goal: u32,
}

impl DailyLog {
    fn new(date: NaiveDate, daily_goal: u32) -> Self {
        Self {
            date,
            consumed: 0,
            macros: Macros::default(),
            food_log: BTreeMap::new(),
            daily_goal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub calories: u32,
    pub goal: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meals_logged: usize,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One day of logged food, persisted after every change.
pub struct CalorieTracker {
    path: PathBuf,
    day: DailyLog,
}

impl CalorieTracker {
    /// Load the stored day. A log from another day is discarded but its goal
    /// carries over.
    pub async fn open(path: impl AsRef<Path>, today: NaiveDate) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let day = match read_json::<DailyLog>(&path).await? {
            Some(day) if day.date == today => day,
            Some(stale) => DailyLog::new(today, stale.daily_goal),
            None => DailyLog::new(today, DEFAULT_GOAL),
        };
        Ok(Self { path, day })
    }

    pub fn goal(&self) -> u32 {
        self.day.daily_goal
    }

    pub fn consumed(&self) -> u32 {
        self.day.consumed
    }

    pub fn macros(&self) -> Macros {
        self.day.macros
    }

    pub fn meal(&self, meal: Meal) -> &[LogEntry] {
        self.day.food_log.get(&meal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub async fn set_goal(&mut self, goal: u32) -> Result<()> {
        if !(MIN_GOAL..=MAX_GOAL).contains(&goal) {
            return Err(ScanError::InvalidGoal(goal));
        }
        let mut updated = self.day.clone();
        updated.daily_goal = goal;
        self.commit(updated).await
    }

    pub async fn add_food(&mut self, meal: Meal, food: &str, servings: f64, now: DateTime<Utc>) -> Result<LogEntry> {
        let info = lookup(food).ok_or_else(|| ScanError::UnknownFood(food.to_string()))?;
        if servings <= 0.0 || !servings.is_finite() || servings > MAX_SERVINGS {
            return Err(ScanError::InvalidServings(servings));
        }

        let entry = LogEntry {
            name: food.trim().to_lowercase(),
            servings,
            calories: (info.calories * servings).round() as u32,
            protein: round_tenth(info.protein * servings),
            carbs: round_tenth(info.carbs * servings),
            fat: round_tenth(info.fat * servings),
            time: now,
        };

        let mut updated = self.day.clone();
        updated.consumed = updated.consumed.saturating_add(entry.calories);
        updated.macros.protein += entry.protein;
        updated.macros.carbs += entry.carbs;
        updated.macros.fat += entry.fat;
        updated.food_log.entry(meal).or_default().push(entry.clone());
        self.commit(updated).await?;

        log::debug!("Logged {} kcal of {} for {}", entry.calories, entry.name, meal);
        Ok(entry)
    }

    /// Percentage of the goal consumed, capped at 100.
    pub fn progress(&self) -> f64 {
        (self.day.consumed as f64 / self.day.daily_goal as f64 * 100.0).min(100.0)
    }

    pub fn summary(&self) -> DailySummary {
        DailySummary {
            calories: self.day.consumed,
            goal: self.day.daily_goal,
            protein: self.day.macros.protein.round(),
            carbs: self.day.macros.carbs.round(),
            fat: self.day.macros.fat.round(),
            meals_logged: self.day.food_log.values().map(Vec::len).sum(),
        }
    }

    /// Start a fresh log when `today` differs from the tracked day. Returns
    /// whether a reset happened.
    pub async fn roll_over(&mut self, today: NaiveDate) -> Result<bool> {
        if self.day.date == today {
            return Ok(false);
        }
        self.commit(DailyLog::new(today, self.day.daily_goal)).await?;
        Ok(true)
    }

    /// Persist `updated` and only then make it the current day, so a failed
    /// write leaves the tracker unchanged.
    async fn commit(&mut self, updated: DailyLog) -> Result<()> {
        if let Err(e) = write_json(&self.path, &updated).await {
            log::error!("Failed to save calorie log to {}: {}", self.path.display(), e);
            return Err(e);
        }
        self.day = updated;
        Ok(())
    }
}
