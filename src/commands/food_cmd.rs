use chrono::Utc;
use colored::Colorize;

use super::spinner;
use crate::database::HistoryStore;
use crate::food::models::{FoodRecord, Note, Nutrient};
use crate::food::{FoodScanner, ImageData};

pub async fn handle_command(
    command: &str,
    args: &str,
    scanner: &FoodScanner,
    history: &HistoryStore,
) -> Result<(), String> {
    match command {
        "scan" => scan(args, scanner, history).await,
        "search" => search(args, scanner).await,
        "suggest" => suggest(args, scanner).await,
        _ => Err(format!("Unknown food command: {}", command)),
    }
}

async fn scan(source: &str, scanner: &FoodScanner, history: &HistoryStore) -> Result<(), String> {
    if source.is_empty() {
        println!("Please specify an image file or data URL to scan.");
        return Ok(());
    }

    let image = if source.starts_with("data:") {
        ImageData::from_data_url(source)
    } else {
        ImageData::from_path(source).await
    }
    .map_err(|e| format!("Failed to load image: {}", e))?;

    let pb = spinner("Analyzing image...");
    let scan = scanner.analyze_image(&image).await;
    pb.finish_and_clear();

    println!(
        "\n📸 Identified {} ({:.0}% confidence)",
        scan.record.name.bright_yellow().bold(),
        scan.confidence * 100.0
    );
    print_record(&scan.record);

    if history.preferences().await.auto_save {
        match history.save(&scan, Some(&image), Utc::now()).await {
            Ok(id) => println!("💾 Saved to history as {}", id.dimmed()),
            Err(e) => log::warn!("Could not save scan to history: {}", e),
        }
    }
    Ok(())
}

async fn search(query: &str, scanner: &FoodScanner) -> Result<(), String> {
    if query.is_empty() {
        println!("Please specify a food to search for.");
        return Ok(());
    }

    let pb = spinner(&format!("Looking up {}...", query));
    let result = scanner.search_food(query).await;
    pb.finish_and_clear();

    let record = result.map_err(|e| e.to_string())?;
    println!("\n🔍 {}", record.name.bright_yellow().bold());
    print_record(&record);
    Ok(())
}

async fn suggest(query: &str, scanner: &FoodScanner) -> Result<(), String> {
    let suggestions = scanner.suggestions(query).await;
    if suggestions.is_empty() {
        println!("No suggestions for \"{}\" (type at least two characters).", query);
        return Ok(());
    }
    for suggestion in suggestions {
        println!("  • {} - {}", suggestion.name.cyan(), suggestion.description.dimmed());
    }
    Ok(())
}

fn unit(nutrient: Nutrient) -> &'static str {
    match nutrient {
        Nutrient::Calories => "kcal",
        Nutrient::Sodium | Nutrient::Potassium => "mg",
        _ => "g",
    }
}

fn print_notes(heading: &str, notes: &[Note], warning: bool) {
    if notes.is_empty() {
        return;
    }
    println!("\n{}", heading.bold());
    for note in notes {
        let title = if warning {
            note.title.yellow()
        } else {
            note.title.green()
        };
        println!("  • {}: {}", title, note.description);
    }
}

fn print_record(record: &FoodRecord) {
    println!("\n{}", "Nutrition (per 100g):".bold());
    if record.nutrition.is_empty() {
        println!("  {}", "No nutrition data available".dimmed());
    }
    for (nutrient, amount) in &record.nutrition {
        println!("  {:<10} {:>8.1} {}", nutrient.as_str(), amount, unit(*nutrient));
    }

    if !record.ingredients.is_empty() {
        println!("\n{}", "Ingredients:".bold());
        println!("  {}", record.ingredients.join(", "));
    }

    print_notes("Benefits:", &record.benefits, false);
    print_notes("Warnings:", &record.warnings, true);
    println!();
}
