use chrono::{Local, Utc};
use colored::Colorize;

use crate::database::HistoryStore;
use crate::food::calories::{find_foods, recommended_calories, ActivityLevel, CalorieTracker, Meal};
use crate::food::ScanError;

pub async fn handle_command(
    command: &str,
    args: &str,
    tracker: &mut CalorieTracker,
    history: &HistoryStore,
) -> Result<(), String> {
    tracker
        .roll_over(Local::now().date_naive())
        .await
        .map_err(|e| e.to_string())?;

    match command {
        "foods" => {
            let matches = find_foods(args);
            if matches.is_empty() {
                println!("No matches for \"{}\". Try: apple, banana, chicken breast, rice", args);
            }
            for (name, info) in matches {
                println!(
                    "  • {} - {} kcal per {} (protein {}g, carbs {}g, fat {}g)",
                    name.cyan(),
                    info.calories,
                    info.serving,
                    info.protein,
                    info.carbs,
                    info.fat
                );
            }
            Ok(())
        }
        "log" => log_food(args, tracker).await,
        "calories" => {
            show_day(tracker);
            Ok(())
        }
        "goal" => {
            let goal: u32 = args
                .parse()
                .map_err(|_| "Please enter a valid calorie goal between 1000 and 5000.".to_string())?;
            tracker.set_goal(goal).await.map_err(|e| e.to_string())?;

            let mut preferences = history.preferences().await;
            preferences.daily_calorie_goal = goal;
            history
                .set_preferences(preferences)
                .await
                .map_err(|e| e.to_string())?;
            println!("🎯 Daily goal set to {} kcal", goal.to_string().cyan());
            Ok(())
        }
        "recommend" => {
            let activity: ActivityLevel = args.parse().map_err(|e: ScanError| e.to_string())?;
            println!(
                "💡 Recommended daily intake: {} kcal (use 'goal' to apply it)",
                recommended_calories(activity).to_string().cyan()
            );
            Ok(())
        }
        _ => Err(format!("Unknown calorie command: {}", command)),
    }
}

/// `<meal> <food words...> [servings]`
async fn log_food(args: &str, tracker: &mut CalorieTracker) -> Result<(), String> {
    let mut words: Vec<&str> = args.split_whitespace().collect();
    if words.len() < 2 {
        println!("Usage: log <meal> <food> [servings]");
        return Ok(());
    }

    let meal: Meal = words.remove(0).parse().map_err(|e: ScanError| e.to_string())?;
    let servings = match words.last().and_then(|w| w.parse::<f64>().ok()) {
        Some(servings) if words.len() > 1 => {
            words.pop();
            servings
        }
        _ => 1.0,
    };
    let food = words.join(" ");

    let entry = tracker
        .add_food(meal, &food, servings, Utc::now())
        .await
        .map_err(|e| e.to_string())?;
    println!(
        "✅ Added {} x{} to {} ({} kcal)",
        entry.name.cyan(),
        entry.servings,
        meal,
        entry.calories
    );
    Ok(())
}

fn show_day(tracker: &CalorieTracker) {
    let summary = tracker.summary();
    println!(
        "\n🔥 {} / {} kcal ({:.0}%)",
        summary.calories.to_string().bright_yellow().bold(),
        summary.goal,
        tracker.progress()
    );
    println!(
        "  Protein {}g | Carbs {}g | Fat {}g",
        summary.protein, summary.carbs, summary.fat
    );

    for meal in Meal::ALL {
        let entries = tracker.meal(meal);
        println!("\n{}", meal.as_str().bold());
        if entries.is_empty() {
            println!("  {}", "nothing logged".dimmed());
        }
        for entry in entries {
            let plural = if entry.servings == 1.0 { "" } else { "s" };
            println!(
                "  • {} ({} serving{}) - {} kcal",
                entry.name, entry.servings, plural, entry.calories
            );
        }
    }
    println!();
}
