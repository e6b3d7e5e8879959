//! CLI configuration.
//!
//! Handles loading, validating, and merging `convert-me.toml`. Stock
//! defaults are overridden by the user file, and command-line flags
//! override both.
//!
//! ## Config File Location
//!
//! `convert-me.toml` in the working directory, or any file passed with
//! `--config <path>`. A missing default file is not an error; a missing
//! explicit file is.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! format = "png"               # Target format when --to is omitted
//! quality = 85                 # JPEG/WebP quality (1-100)
//! target_size_kb = 0           # Size budget for JPEG/WebP (0 = none)
//! maintain_aspect_ratio = true # Scale the other axis on --max-width/--max-height
//! overwrite = false            # Replace existing outputs instead of numbering
//!
//! [processing]
//! max_processes = 4            # Parallel conversions (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::formats::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "convert-me.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `convert-me.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Conversion defaults applied when a flag is not given.
    pub defaults: DefaultsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.defaults.quality) {
            return Err(ConfigError::Validation(
                "defaults.quality must be 1-100".into(),
            ));
        }
        match ImageFormat::from_name(&self.defaults.format) {
            None => Err(ConfigError::Validation(format!(
                "defaults.format: unknown format '{}'",
                self.defaults.format
            ))),
            Some(f) if !f.is_valid_conversion_target() => Err(ConfigError::Validation(format!(
                "defaults.format: {f} cannot be a conversion target"
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// Conversion defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Target format name or extension (`"png"`, `"jpg"`, `"webp"`, …).
    pub format: String,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Size budget in KiB for lossy formats; 0 disables the search.
    pub target_size_kb: u64,
    pub maintain_aspect_ratio: bool,
    pub overwrite: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            quality: 85,
            target_size_kb: 0,
            maintain_aspect_ratio: true,
            overwrite: false,
        }
    }
}

impl DefaultsConfig {
    /// The configured target format. Only meaningful after
    /// [`ConverterConfig::validate`] succeeded.
    pub fn target_format(&self) -> ImageFormat {
        ImageFormat::from_name(&self.format).unwrap_or(ImageFormat::Png)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversions.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ConverterConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// With `explicit = Some(path)` the file must exist. Otherwise
/// `convert-me.toml` in `cwd` is used when present, and stock defaults when
/// not.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ConverterConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let implicit = cwd.join(CONFIG_FILE_NAME);
            if implicit.is_file() {
                Some(load_raw_config(&implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `convert-me.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# convert-me configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags always win.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion defaults
# ---------------------------------------------------------------------------
[defaults]
# Target format when --to is not given.
# One of: jpg, png, webp, gif, bmp, tiff, ico
format = "png"

# Encoding quality for JPEG and WebP (1 = worst, 100 = best).
# Ignored by lossless formats.
quality = 85

# Size budget in KiB for JPEG and WebP. When non-zero, quality is searched
# (up to 10 trial encodes) for the best result under the budget.
# 0 disables the search.
target_size_kb = 0

# When shrinking with --max-width / --max-height, scale the other axis too.
maintain_aspect_ratio = true

# Replace existing output files instead of writing "name (1).ext".
overwrite = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversions when several inputs are given.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
