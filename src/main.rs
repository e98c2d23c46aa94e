//! Pulse Sentinel CLI
//!
//! Runs baselines, flag checks, and context builds against a JSON record
//! snapshot exported by the sync collaborator.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pulse_sentinel::{
    alert_flags,
    config::Config,
    core::context::{build_daily_context, build_weekly_context},
    core::{rolling_baseline, BaselineField, FlagEngine},
    store::MemoryStore,
    LogNotifier, VERSION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pulse-sentinel")]
#[command(version = VERSION)]
#[command(about = "Rule-based anomaly flagging over wearable biometric history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all flag checks against a record snapshot
    Check {
        /// Path to the JSON record snapshot
        #[arg(long, short)]
        data: PathBuf,

        /// Emit flags as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compute a rolling baseline
    Baseline {
        /// Path to the JSON record snapshot
        #[arg(long, short)]
        data: PathBuf,

        /// Field to baseline (hrv or rhr)
        #[arg(long, default_value = "hrv")]
        field: String,

        /// Trailing window in days
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Build a narration context from a record snapshot
    Context {
        /// Path to the JSON record snapshot
        #[arg(long, short)]
        data: PathBuf,

        /// Build the weekly context instead of the daily one
        #[arg(long)]
        weekly: bool,

        /// Weeks of history for the weekly context
        #[arg(long, default_value = "1")]
        weeks: i64,

        /// Target date for the daily context (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the resolved configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { data, json } => cmd_check(&data, json),
        Commands::Baseline { data, field, days } => cmd_baseline(&data, &field, days),
        Commands::Context {
            data,
            weekly,
            weeks,
            date,
        } => cmd_context(&data, weekly, weeks, date),
        Commands::Config => cmd_config(),
    }
}

fn load_store(path: &PathBuf) -> MemoryStore {
    match MemoryStore::from_json_file(path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: could not load snapshot {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config, using defaults: {e}");
            Config::default()
        }
    }
}

fn cmd_check(data: &PathBuf, json: bool) {
    let store = load_store(data);
    let engine = FlagEngine::with_config(&store, load_config());

    let flags = match engine.run_with_fresh_baseline() {
        Ok(flags) => flags,
        Err(e) => {
            eprintln!("Error: flag check failed: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&flags) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("Error: could not serialize flags: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if flags.is_empty() {
        println!("No flags active.");
        return;
    }

    println!("{} flag(s) active:", flags.len());
    for flag in &flags {
        println!("  [{}] {}: {}", flag.severity, flag.key, flag.message);
    }
    alert_flags(&LogNotifier, &flags);
}

fn cmd_baseline(data: &PathBuf, field: &str, days: i64) {
    let field = match field {
        "hrv" => BaselineField::Hrv,
        "rhr" => BaselineField::RestingHeartRate,
        other => {
            eprintln!("Error: unknown baseline field '{other}' (expected hrv or rhr)");
            std::process::exit(1);
        }
    };

    let store = load_store(data);
    match rolling_baseline(&store, Utc::now(), days, field) {
        Ok(Some(value)) => println!("{field} baseline over {days}d: {value}"),
        Ok(None) => println!("{field} baseline over {days}d: insufficient data"),
        Err(e) => {
            eprintln!("Error: baseline computation failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_context(data: &PathBuf, weekly: bool, weeks: i64, date: Option<NaiveDate>) {
    let store = load_store(data);
    let result = if weekly {
        build_weekly_context(&store, weeks)
    } else {
        build_daily_context(&store, date.unwrap_or_else(|| Utc::now().date_naive()))
    };

    match result {
        Ok(context) => println!("{context}"),
        Err(e) => {
            eprintln!("Error: context build failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    println!("Config path: {}", Config::config_path().display());
    let config = load_config();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: could not serialize config: {e}"),
    }
}
