use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::thresholds::RiskThresholds;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Equipment sensor analytics and risk reporting
#[derive(Parser, Debug, Clone)]
#[command(
    name = "equip-analyzer",
    about = "Equipment sensor analytics and risk reporting",
    version
)]
pub struct Settings {
    /// CSV or JSON input (a file, or a directory analyzed file by file)
    pub input: Option<PathBuf>,

    /// Run mode
    #[arg(long, default_value = "summary", value_parser = ["summary", "report", "watch"])]
    pub mode: String,

    /// Input format ("auto" decides by file extension)
    #[arg(long, default_value = "auto", value_parser = ["csv", "json", "auto"])]
    pub format: String,

    /// Pressure above this limit flags a reading as critical
    #[arg(long)]
    pub pressure_limit: Option<f64>,

    /// Temperature above this limit flags a reading as critical
    #[arg(long)]
    pub temperature_limit: Option<f64>,

    /// Risk score above this limit flags a reading as critical
    #[arg(long)]
    pub risk_score_limit: Option<f64>,

    /// History entries shown in the summary view
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(i64).range(1..=100))]
    pub history_window: i64,

    /// History entries included in the rendered report
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(i64).range(1..=500))]
    pub report_window: i64,

    /// Truncate source names in the report to this many characters
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u16).range(4..=120))]
    pub filename_truncate: u16,

    /// Timezone for displayed timestamps (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Refresh interval in seconds for watch mode (1-60)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub refresh_rate: u32,

    /// History ledger file path
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Write the rendered report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.equip-analyzer/last_used.json`.
///
/// Threshold overrides are intentionally not persisted; limits are explicit
/// per run.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_window: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_window: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_truncate: Option<u16>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.equip-analyzer/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".equip-analyzer").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> Result<()> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            // Resolve auto values and return without re-persisting.
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Merge last-used values for fields that were NOT explicitly set on the
        // command line (CLI always wins). Threshold limits are never loaded
        // from last-used.
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(&matches, "history_window") {
            if let Some(v) = last.history_window {
                settings.history_window = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "report_window") {
            if let Some(v) = last.report_window {
                settings.report_window = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "filename_truncate") {
            if let Some(v) = last.filename_truncate {
                settings.filename_truncate = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Build the validated risk-threshold configuration from the CLI
    /// overrides (or defaults when none were given).
    pub fn thresholds(&self) -> Result<RiskThresholds> {
        RiskThresholds::with_limits(
            self.pressure_limit,
            self.temperature_limit,
            self.risk_score_limit,
        )
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        // Resolve "auto" timezone → system timezone.
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            timezone: Some(s.timezone.clone()),
            format: Some(s.format.clone()),
            history_window: Some(s.history_window),
            report_window: Some(s.report_window),
            refresh_rate: Some(s.refresh_rate),
            filename_truncate: Some(s.filename_truncate),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
