use chrono::{Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::config::ScannerConfig;
use crate::database::HistoryStore;
use crate::food::calories::CalorieTracker;
use crate::food::config::FoodConfig;
use crate::food::FoodScanner;

mod calorie_cmd;
mod food_cmd;
mod history_cmd;
mod system;

pub struct CommandHandler {
    scanner: FoodScanner,
    history: HistoryStore,
    tracker: CalorieTracker,
}

impl CommandHandler {
    pub async fn new(config: &ScannerConfig, keys: &FoodConfig) -> Result<Self, String> {
        let scanner = FoodScanner::new(config, keys);

        let history = HistoryStore::open(config.history_path())
            .await
            .map_err(|e| format!("Failed to open history: {}", e))?;
        if let Err(e) = history.cleanup(Utc::now()).await {
            log::warn!("History cleanup failed: {}", e);
        }

        let tracker = CalorieTracker::open(config.calories_path(), Local::now().date_naive())
            .await
            .map_err(|e| format!("Failed to open calorie log: {}", e))?;

        let mut handler = Self {
            scanner,
            history,
            tracker,
        };
        handler.sync_goal().await;
        Ok(handler)
    }

    /// The stored preference is the source of truth for the daily goal.
    async fn sync_goal(&mut self) {
        let goal = self.history.preferences().await.daily_calorie_goal;
        if goal == self.tracker.goal() {
            return;
        }
        if let Err(e) = self.tracker.set_goal(goal).await {
            log::warn!("Ignoring stored calorie goal {}: {}", goal, e);
        }
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<(), String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        let (command, args) = match input.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (input, ""),
        };
        let command = command.to_lowercase();

        match command.as_str() {
            "help" | "exit" | "quit" => system::handle_command(&command),
            "providers" => {
                system::list_providers(&self.scanner);
                Ok(())
            }
            "clear-cache" => {
                self.scanner.clear_cache();
                println!("🧹 Cache cleared");
                Ok(())
            }
            "scan" | "search" | "suggest" => {
                food_cmd::handle_command(&command, args, &self.scanner, &self.history).await
            }
            "history" | "stats" | "forget" | "clear-history" | "export" | "import" => {
                history_cmd::handle_command(&command, args, &self.history).await?;
                if command == "import" {
                    self.sync_goal().await;
                }
                Ok(())
            }
            "log" | "calories" | "goal" | "recommend" | "foods" => {
                calorie_cmd::handle_command(&command, args, &mut self.tracker, &self.history).await
            }
            _ => Err(format!(
                "Unknown command: {}. Type 'help' for available commands.",
                command
            )),
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}
