use chrono::{Local, Utc};
use colored::Colorize;

use crate::database::{HistoryItem, HistoryStore};
use crate::food::models::Nutrient;

pub async fn handle_command(command: &str, args: &str, history: &HistoryStore) -> Result<(), String> {
    match command {
        "history" => {
            let items = if args.is_empty() {
                history.items().await
            } else {
                history.search(args).await
            };
            list(&items);
            Ok(())
        }
        "stats" => stats(history).await,
        "forget" => {
            if args.is_empty() {
                println!("Please specify the id of the scan to delete.");
                return Ok(());
            }
            if history.delete(args).await.map_err(|e| e.to_string())? {
                println!("🗑️ Deleted {}", args);
            } else {
                println!("No scan with id {}", args);
            }
            Ok(())
        }
        "clear-history" => {
            history.clear().await.map_err(|e| e.to_string())?;
            println!("🗑️ History cleared");
            Ok(())
        }
        "export" => {
            if args.is_empty() {
                println!("Please specify a file to export to.");
                return Ok(());
            }
            let json = history.export(Utc::now()).await.map_err(|e| e.to_string())?;
            tokio::fs::write(args, json)
                .await
                .map_err(|e| format!("Failed to write {}: {}", args, e))?;
            println!("📤 Exported history to {}", args.bright_yellow());
            Ok(())
        }
        "import" => {
            if args.is_empty() {
                println!("Please specify a file to import.");
                return Ok(());
            }
            let json = tokio::fs::read_to_string(args)
                .await
                .map_err(|e| format!("Failed to read {}: {}", args, e))?;
            let count = history
                .import(&json, Utc::now())
                .await
                .map_err(|e| format!("Failed to import data: {}", e))?;
            println!("📥 Imported {} scans", count);
            Ok(())
        }
        _ => Err(format!("Unknown history command: {}", command)),
    }
}

fn list(items: &[HistoryItem]) {
    if items.is_empty() {
        println!("No scans found.");
        return;
    }
    for item in items {
        let calories = item
            .nutrition
            .get(&Nutrient::Calories)
            .map(|kcal| format!("{:.0} kcal", kcal))
            .unwrap_or_else(|| "? kcal".to_string());
        println!(
            "  {} {} {} ({:.0}%) {}{}",
            item.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string().dimmed(),
            item.name.cyan(),
            calories,
            item.confidence * 100.0,
            item.id.dimmed(),
            if item.imported { " [imported]" } else { "" }
        );
    }
}

async fn stats(history: &HistoryStore) -> Result<(), String> {
    let stats = history.stats(Utc::now()).await;
    println!("\n📊 Scan statistics:");
    println!("  Total:      {}", stats.total.to_string().cyan());
    println!("  Last 24h:   {}", stats.today.to_string().cyan());
    println!("  Last week:  {}", stats.this_week.to_string().cyan());
    println!("  Last month: {}", stats.this_month.to_string().cyan());

    if !stats.top_foods.is_empty() {
        println!("\n🏆 Top foods:");
        for food in &stats.top_foods {
            println!("  • {} ({})", food.name, food.count);
        }
    }
    if !stats.recent_scans.is_empty() {
        println!("\n🕒 Recent scans:");
        list(&stats.recent_scans);
    }
    Ok(())
}
