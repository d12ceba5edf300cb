use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::analysis::DEFAULT_TOP_N;
use crate::utils::{NumberFormatOptions, resolve_timezone};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub formatting: FormattingConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top_n: usize,
    /// IANA name; empty uses the system timezone
    pub timezone: String,
    /// Directory analyzed when none is given on the command line
    pub history_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FormattingConfig {
    pub number_comma: bool,
    pub number_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ExportConfig {
    /// Empty uses ~/Documents/Playtrail
    pub directory: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Empty logs to stderr
    pub file: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            timezone: String::new(),
            history_dir: String::new(),
        }
    }
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            number_comma: true,
            number_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: String::new(),
        }
    }
}

impl FormattingConfig {
    pub fn number_format_options(&self) -> NumberFormatOptions {
        NumberFormatOptions {
            use_comma: self.number_comma,
            use_human: self.number_human,
            locale: self.locale.clone(),
            decimal_places: self.decimal_places,
        }
    }
}

thread_local! {
    static TEST_CONFIG_PATH: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

#[cfg(test)]
pub fn set_test_config_path(path: PathBuf) {
    TEST_CONFIG_PATH.with(|p| *p.borrow_mut() = Some(path));
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(test)]
        {
            if let Some(path) = TEST_CONFIG_PATH.with(|p| p.borrow().clone()) {
                return Ok(path);
            }
        }

        Ok(dirs::home_dir()
            .context("Could not find home directory")?
            .join(".playtrail.toml"))
    }

    pub fn load() -> Result<Option<Config>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(Some(config))
    }

    pub fn save(&self, silent: bool) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        if !silent {
            println!("✅ Configuration saved to: {}", config_path.display());
        }

        Ok(())
    }

    pub fn history_dir(&self) -> Option<PathBuf> {
        non_empty(&self.analysis.history_dir).map(PathBuf::from)
    }

    pub fn export_dir(&self) -> Option<PathBuf> {
        non_empty(&self.export.directory)
            .map(PathBuf::from)
            .or_else(crate::export::default_export_dir)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        non_empty(&self.logging.file).map(PathBuf::from)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Invalid boolean value. Use 'true' or 'false'")
}

// CLI helper functions
pub fn create_default_config(overwrite: bool) -> Result<()> {
    let config = Config::default();
    if !std::fs::exists(Config::config_path()?)? || overwrite {
        config.save(true)?;

        println!("📝 Created default configuration file.");
        println!("📍 Point it at your streaming history export:");
        println!("   playtrail config set history-dir ...");
        println!("or");
        println!("   {}", Config::config_path()?.display());
    } else {
        println!("Configuration already exists.  Pass `--overwrite` to overwrite.");
    }

    Ok(())
}

pub fn show_config() -> Result<()> {
    match Config::load()? {
        Some(config) => {
            let or_default = |value: &str, fallback: &str| {
                non_empty(value).unwrap_or(fallback).to_string()
            };
            println!("🔧 Current configuration:");
            println!(
                "   History Dir: {}",
                or_default(&config.analysis.history_dir, "Not set")
            );
            println!("   Top N: {}", config.analysis.top_n);
            println!(
                "   Timezone: {}",
                or_default(&config.analysis.timezone, "System")
            );
            println!("   Number Comma: {}", config.formatting.number_comma);
            println!("   Number Human: {}", config.formatting.number_human);
            println!("   Locale: {}", config.formatting.locale);
            println!("   Decimal Places: {}", config.formatting.decimal_places);
            println!(
                "   Export Dir: {}",
                or_default(&config.export.directory, "Default")
            );
            println!("   Log Level: {}", config.logging.level);
            println!("   Log File: {}", or_default(&config.logging.file, "stderr"));
        }
        None => {
            println!("❌ No configuration file found.");
            println!("   Run 'playtrail config init' to create one.");
        }
    }
    Ok(())
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?.unwrap_or_default();

    match key {
        "top-n" => {
            let n = value.parse::<usize>().context("Invalid number value")?;
            if n == 0 {
                anyhow::bail!("top-n must be at least 1");
            }
            config.analysis.top_n = n;
        }
        "timezone" => {
            resolve_timezone(value)?;
            config.analysis.timezone = value.trim().to_string();
        }
        "history-dir" => config.analysis.history_dir = value.to_string(),
        "number-comma" => config.formatting.number_comma = parse_bool(value)?,
        "number-human" => config.formatting.number_human = parse_bool(value)?,
        "locale" => {
            config.formatting.locale = value.to_string();
        }
        "decimal-places" => {
            let places = value.parse::<usize>().context("Invalid number value")?;
            config.formatting.decimal_places = places;
        }
        "export-dir" => config.export.directory = value.to_string(),
        "log-level" => {
            tracing_subscriber::EnvFilter::try_new(value).context("Invalid log level")?;
            config.logging.level = value.to_string();
        }
        "log-file" => config.logging.file = value.to_string(),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    config.save(false)?;
    Ok(())
}
