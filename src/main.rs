use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use playtrail::analysis::{AnalysisOptions, analyze_with};
use playtrail::config::{self, Config};
use playtrail::export::{export, export_to_dir};
use playtrail::logging;
use playtrail::report::{render_text, to_json};
use playtrail::sources::SourceRegistry;
use playtrail::utils::{self, resolve_timezone};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "playtrail")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use comma-separated number formatting
    #[arg(long, global = true)]
    number_comma: bool,

    /// Use human-readable number formatting (k, m, b, t)
    #[arg(short = 'H', long, global = true)]
    number_human: bool,

    /// Locale for number formatting (en, de, fr, es, it, ja, ko, zh)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Number of decimal places for minutes, hours and days
    #[arg(long, global = true)]
    decimal_places: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a folder of streaming history files
    Analyze(AnalyzeArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args, Default)]
struct AnalyzeArgs {
    /// Folder containing Streaming_History_Audio_*.json files (defaults to the
    /// configured history-dir)
    dir: Option<PathBuf>,

    /// Number of entries in the top artists, tracks and albums lists
    #[arg(long)]
    top: Option<usize>,

    /// IANA timezone for hour and day buckets (defaults to the system timezone)
    #[arg(long)]
    timezone: Option<String>,

    /// Print the results as JSON instead of the text report
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Pretty-print JSON instead of a single line
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Also write the results as JSON. Takes an optional file or directory;
    /// defaults to the configured export directory.
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    export: Option<Option<PathBuf>>,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Create default configuration file
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (top-n, timezone, history-dir, number-comma, number-human,
        /// locale, decimal-places, export-dir, log-level, log-file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Load config file to get defaults
    let config = Config::load().unwrap_or(None).unwrap_or_default();

    if let Err(e) = logging::init(&config) {
        eprintln!("Error setting up logging: {e:#}");
    }

    // Create format options merging config defaults with CLI overrides
    let mut format_options = config.formatting.number_format_options();
    format_options.use_comma |= cli.number_comma;
    format_options.use_human |= cli.number_human;
    if let Some(locale) = cli.locale {
        format_options.locale = locale;
    }
    if let Some(places) = cli.decimal_places {
        format_options.decimal_places = places;
    }

    match cli.command {
        None => {
            if config.history_dir().is_some() {
                if let Err(e) = run_analyze(AnalyzeArgs::default(), &config, &format_options) {
                    eprintln!("Error: {e:#}");
                    std::process::exit(1);
                }
            } else {
                let _ = Cli::command().print_help();
            }
        }
        Some(Commands::Analyze(args)) => {
            if let Err(e) = run_analyze(args, &config, &format_options) {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config(config_args)) => {
            handle_config_subcommand(config_args);
        }
    }
}

fn run_analyze(
    args: AnalyzeArgs,
    config: &Config,
    format_options: &utils::NumberFormatOptions,
) -> Result<()> {
    let dir = args.dir.or_else(|| config.history_dir()).context(
        "No history folder given. Pass one, or run `playtrail config set history-dir <DIR>`",
    )?;

    let timezone = resolve_timezone(
        args.timezone
            .as_deref()
            .unwrap_or(&config.analysis.timezone),
    )?;
    let options = AnalysisOptions {
        top_n: args.top.unwrap_or(config.analysis.top_n).max(1),
        timezone,
    };

    let result = analyze_with(&dir, &options, &SourceRegistry::default())
        .with_context(|| format!("Failed to analyze {}", dir.display()))?;

    if args.json {
        println!("{}", to_json(&result, args.pretty)?);
    } else {
        print!("{}", render_text(&result, format_options));
    }

    if let Some(destination) = args.export {
        let written = match destination {
            Some(path) => export(&result, &path)?,
            None => {
                let dir = config
                    .export_dir()
                    .context("Could not determine an export directory")?;
                export_to_dir(&result, &dir)?
            }
        };
        eprintln!("📁 Results exported to {}", written.display());
    }

    Ok(())
}

fn handle_config_subcommand(config_args: ConfigArgs) {
    match config_args.subcommand {
        ConfigSubcommands::Init { overwrite } => {
            if let Err(e) = config::create_default_config(overwrite) {
                eprintln!("Error creating config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Show => {
            if let Err(e) = config::show_config() {
                eprintln!("Error showing config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Set { key, value } => {
            if let Err(e) = config::set_config_value(&key, &value) {
                eprintln!("Error setting config: {e}");
                std::process::exit(1);
            }
        }
    }
}
