use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use food_scan::commands::CommandHandler;
use food_scan::config::ScannerConfig;
use food_scan::food::config::FoodConfig;
use food_scan::food::http::RetryMode;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scan a single image (file path or data URL) and exit
    #[arg(long)]
    scan: Option<String>,

    /// Look up a single food and exit
    #[arg(long)]
    search: Option<String>,

    /// Directory for history and calorie data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Do not retry client errors other than 429
    #[arg(long)]
    strict_retry: bool,

    /// Leave fields empty instead of using built-in tables when sources fail
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colored::control::set_override(true);
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = ScannerConfig::from_env();
    if let Some(dir) = args.data_dir.clone() {
        config.data_dir = dir;
    }
    if args.strict_retry {
        config.retry.mode = RetryMode::Strict;
    }
    if args.no_fallback {
        config.static_fallback = false;
    }
    let keys = FoodConfig::from_env();

    let mut command_handler = CommandHandler::new(&config, &keys)
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to start food scanner")?;

    // One-shot mode
    let one_shot = match (&args.scan, &args.search) {
        (Some(image), _) => Some(format!("scan {}", image)),
        (None, Some(food)) => Some(format!("search {}", food)),
        (None, None) => None,
    };
    if let Some(command) = one_shot {
        return command_handler.handle_command(&command).await.map_err(anyhow::Error::msg);
    }

    println!("{}", "🍎 Food Scanner".bright_green().bold());
    if !keys.has_any_key() {
        println!(
            "{}",
            "No API keys configured, using colour analysis and built-in tables.".yellow()
        );
    }
    if let Err(e) = command_handler.handle_command("help").await {
        println!("{}", e.red());
    }

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("🍽️  ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                if let Err(e) = command_handler.handle_command(input).await {
                    println!("{}", e.red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
