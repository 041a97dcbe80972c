use colored::Colorize;

use crate::food::FoodScanner;

pub fn handle_command(input: &str) -> Result<(), String> {
    match input.to_lowercase().as_str() {
        "help" => {
            println!("\n🍽️ Food Scanner Commands:");
            println!("  scan <image>      - Identify the food in an image file or data URL");
            println!("  search <food>     - Look up nutrition, ingredients and health notes");
            println!("  suggest <prefix>  - Suggest food names");
            println!("  providers         - Show configured recognition and data sources");
            println!("  clear-cache       - Forget cached scans and searches");
            println!();

            println!("📜 History Commands:");
            println!("  history [query]   - List saved scans, optionally filtered");
            println!("  stats             - Show scan statistics");
            println!("  forget <id>       - Delete a saved scan");
            println!("  clear-history     - Delete all saved scans");
            println!("  export <file>     - Export history and preferences to JSON");
            println!("  import <file>     - Replace history with an exported file");
            println!();

            println!("🔥 Calorie Commands:");
            println!("  foods <query>                  - Find foods in the calorie table");
            println!("  log <meal> <food> [servings]   - Log food for breakfast, lunch, dinner or snacks");
            println!("  calories                       - Show today's intake");
            println!("  goal <kcal>                    - Set the daily goal (1000-5000)");
            println!("  recommend <activity>           - Suggest a goal (sedentary, light, moderate, very)");
            println!("  Example: log lunch chicken breast 1.5");
            println!();

            println!("⚙️ System Commands:");
            println!("  help  - Show this help menu");
            println!("  exit  - Exit the program");
            Ok(())
        }
        "exit" | "quit" => {
            println!("👋 Goodbye!");
            std::process::exit(0);
        }
        _ => Err("Unknown system command. Type 'help' for available commands.".to_string()),
    }
}

pub fn list_providers(scanner: &FoodScanner) {
    println!("\n🤖 Recognition providers (in order):");
    let recognizers = scanner.recognizer_names();
    if recognizers.is_empty() {
        println!("  {}", "none configured".red());
    }
    for name in recognizers {
        println!("  • {} - {}", name, "✅ Ready".green());
    }
    println!("  • Colour analysis - {}", "always available".cyan());

    println!("\n📚 Food data sources (in order):");
    for name in scanner.source_names() {
        println!("  • {} - {}", name, "✅ Ready".green());
    }
    println!("  • Built-in tables - {}", "fallback".cyan());
    println!("\nSet SPOONACULAR_API_KEY, LOGMEAL_API_KEY or USDA_API_KEY to enable more sources.");
}
