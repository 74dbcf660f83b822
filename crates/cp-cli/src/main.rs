//! Cleanplaats CLI
//!
//! Offline tool for checking what the extension would do with a URL or a
//! stored settings record.

use std::fs;

use clap::{Parser, Subcommand};

use cp_core::rewrite::{rewrite_api_url, rewrite_navigation_url, RewriteContext};
use cp_core::rule::RuleSync;
use cp_core::settings::{Settings, DEFAULT_RESULTS_PER_PAGE, RESULTS_PER_PAGE_CHOICES};
use cp_core::types::SortMode;

#[derive(Parser)]
#[command(name = "cp-cli")]
#[command(about = "Cleanplaats rewrite and rule inspection tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the corrected form of a result-page or search API URL
    Rewrite {
        /// URL to rewrite
        url: String,

        /// Results per page
        #[arg(short, long, default_value = DEFAULT_RESULTS_PER_PAGE)]
        limit: String,

        /// Sort mode
        #[arg(short, long, default_value = "standard")]
        sort: String,

        /// Treat the URL as a search API request (query string options)
        #[arg(long)]
        api: bool,
    },

    /// Print the redirect rule update for a settings record
    Rule {
        /// Settings file (stored JSON record); overrides --limit and --sort
        #[arg(long)]
        settings: Option<String>,

        /// Results per page
        #[arg(short, long, default_value = DEFAULT_RESULTS_PER_PAGE)]
        limit: String,

        /// Sort mode
        #[arg(short, long, default_value = "standard")]
        sort: String,
    },

    /// Normalize a stored settings record
    Settings {
        /// Settings file to read
        input: String,
    },

    /// List the sort modes and their URL keys
    SortModes,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Rewrite { url, limit, sort, api } => cmd_rewrite(&url, &limit, &sort, api),
        Commands::Rule { settings, limit, sort } => cmd_rule(settings.as_deref(), &limit, &sort),
        Commands::Settings { input } => cmd_settings(&input),
        Commands::SortModes => cmd_sort_modes(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn parse_sort(sort: &str) -> Result<SortMode, String> {
    SortMode::parse(sort).ok_or_else(|| {
        let known: Vec<&str> = SortMode::ALL.iter().map(|m| m.as_str()).collect();
        format!("Unknown sort mode '{}' (expected one of: {})", sort, known.join(", "))
    })
}

fn check_limit(limit: &str) -> Result<(), String> {
    if RESULTS_PER_PAGE_CHOICES.contains(&limit) {
        Ok(())
    } else {
        Err(format!(
            "Unsupported results per page '{}' (expected one of: {})",
            limit,
            RESULTS_PER_PAGE_CHOICES.join(", ")
        ))
    }
}

fn read_settings(path: &str) -> Result<Settings, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Settings::parse(&content).map_err(|e| format!("Failed to parse '{}': {}", path, e))
}

fn cmd_rewrite(url: &str, limit: &str, sort: &str, api: bool) -> Result<(), String> {
    check_limit(limit)?;
    let ctx = RewriteContext::new(limit, parse_sort(sort)?);

    let rewritten = if api {
        rewrite_api_url(url, &ctx)
    } else {
        rewrite_navigation_url(url, &ctx)
    };

    match rewritten {
        Some(url) => println!("{}", url),
        None => println!("no rewrite"),
    }
    Ok(())
}

fn cmd_rule(settings_path: Option<&str>, limit: &str, sort: &str) -> Result<(), String> {
    let settings = match settings_path {
        Some(path) => read_settings(path)?,
        None => {
            let mut settings = Settings::default();
            check_limit(limit)?;
            settings.set_results_per_page(limit);
            settings.default_sort_mode = parse_sort(sort)?;
            settings
        }
    };

    let update = RuleSync::plan(&settings);
    let json = serde_json::to_string_pretty(&update).map_err(|e| format!("Failed to encode rule: {}", e))?;
    println!("{}", json);

    if update.add_rules.is_empty() {
        eprintln!("(default settings: no redirect rule is installed)");
    }
    Ok(())
}

fn cmd_settings(path: &str) -> Result<(), String> {
    let settings = read_settings(path)?;
    let value = serde_json::to_value(&settings).map_err(|e| format!("Failed to encode settings: {}", e))?;
    let json = serde_json::to_string_pretty(&value).map_err(|e| format!("Failed to encode settings: {}", e))?;
    println!("{}", json);
    println!();
    println!("Enabled filters:  {:?}", settings.enabled_filters());
    println!("Default rewrite:  {}", settings.is_default_rewrite());
    Ok(())
}

fn cmd_sort_modes() -> Result<(), String> {
    println!("{:<24} {:<28} {:<12} Label", "Mode", "sortBy", "sortOrder");
    for mode in SortMode::ALL {
        let keys = mode.keys();
        println!(
            "{:<24} {:<28} {:<12} {}",
            mode.as_str(),
            keys.sort_by.as_str(),
            keys.sort_order.as_str(),
            mode.label()
        );
    }
    Ok(())
}
