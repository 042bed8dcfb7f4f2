//! Session options from TOML and the environment.
//!
//! Resolution order: built-in defaults, then the config file (if it exists),
//! then `VSI_*` environment variables.
//!
//! ```toml
//! context_window = 8192
//! watchdog_ms = 15000
//! acceleration_unavailable = "no GPU backend on this target"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use vsi_core::{AccelerationHint, SessionOptions};

use crate::error::{ConfigError, Result};

pub const ENV_CONFIG: &str = "VSI_CONFIG";
pub const ENV_CONTEXT_WINDOW: &str = "VSI_CONTEXT_WINDOW";
pub const ENV_WATCHDOG_MS: &str = "VSI_WATCHDOG_MS";
pub const ENV_RELEASE_TIMEOUT_MS: &str = "VSI_RELEASE_TIMEOUT_MS";
pub const ENV_ACCELERATION: &str = "VSI_ACCELERATION";

const DEFAULT_CONFIG_FILE: &str = "vision.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    context_window: Option<u32>,
    watchdog_ms: Option<u64>,
    release_timeout_ms: Option<u64>,
    use_acceleration: Option<bool>,
    gpu_layers: Option<u32>,
    projector_extension: Option<String>,
    acceleration_unavailable: Option<String>,
    /// Accepted only so `false` can be spelled out; `true` is rejected.
    context_shift: Option<bool>,
}

impl FileConfig {
    fn apply(self, mut opts: SessionOptions) -> Result<SessionOptions> {
        if self.context_shift == Some(true) {
            return Err(ConfigError::Invalid(
                "context_shift cannot be enabled for vision sessions".to_string(),
            ));
        }
        if let Some(tokens) = self.context_window {
            opts.context_window = tokens;
        }
        if let Some(ms) = self.watchdog_ms {
            opts.watchdog = Duration::from_millis(ms);
        }
        if let Some(ms) = self.release_timeout_ms {
            opts.release_timeout = Duration::from_millis(ms);
        }
        if let Some(flag) = self.use_acceleration {
            opts.use_acceleration = flag;
        }
        if let Some(layers) = self.gpu_layers {
            opts.gpu_layers = layers;
        }
        if let Some(ext) = self.projector_extension {
            opts.projector_extension = ext;
        }
        if let Some(reason) = self.acceleration_unavailable {
            opts.acceleration = AccelerationHint::unavailable(reason);
        }
        Ok(opts)
    }
}

/// Parse TOML content on top of the defaults. No environment lookups.
pub fn parse_options(content: &str) -> Result<SessionOptions> {
    let file: FileConfig = toml::from_str(content)?;
    let opts = file.apply(SessionOptions::default())?;
    validate(&opts)?;
    Ok(opts)
}

/// Load options from `path` (defaults if it does not exist), then apply
/// environment overrides.
pub fn load_options(path: &Path) -> Result<SessionOptions> {
    load_options_with(path, |key| env::var(key).ok())
}

/// [`load_options`] with environment lookups routed through `lookup`.
pub fn load_options_with<F>(path: &Path, lookup: F) -> Result<SessionOptions>
where
    F: Fn(&str) -> Option<String>,
{
    let opts = if path.exists() {
        let content = fs::read_to_string(path)?;
        parse_options(&content)
            .inspect_err(|e| tracing::warn!("rejected config {}: {e}", path.display()))?
    } else {
        tracing::debug!("no config at {}; using defaults", path.display());
        SessionOptions::default()
    };
    apply_overrides(opts, lookup)
        .inspect_err(|e| tracing::warn!("rejected environment override: {e}"))
}

/// Load from `$VSI_CONFIG`, falling back to `./vision.toml`.
pub fn load_default_options() -> Result<SessionOptions> {
    load_options(&default_config_path())
}

pub fn default_config_path() -> PathBuf {
    env::var(ENV_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Apply `VSI_*` overrides read through `lookup`.
pub fn apply_overrides<F>(mut opts: SessionOptions, lookup: F) -> Result<SessionOptions>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_CONTEXT_WINDOW) {
        opts.context_window = parse_number(ENV_CONTEXT_WINDOW, &v)?;
    }
    if let Some(v) = lookup(ENV_WATCHDOG_MS) {
        opts.watchdog = Duration::from_millis(parse_number(ENV_WATCHDOG_MS, &v)?);
    }
    if let Some(v) = lookup(ENV_RELEASE_TIMEOUT_MS) {
        opts.release_timeout = Duration::from_millis(parse_number(ENV_RELEASE_TIMEOUT_MS, &v)?);
    }
    if let Some(v) = lookup(ENV_ACCELERATION) {
        opts.acceleration = match v.trim().to_ascii_lowercase().as_str() {
            "off" | "0" | "false" | "none" => {
                AccelerationHint::unavailable(format!("disabled by {ENV_ACCELERATION}"))
            }
            "on" | "1" | "true" | "auto" => AccelerationHint::Available,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "{ENV_ACCELERATION}: unrecognized value '{other}'"
                )));
            }
        };
    }
    validate(&opts)?;
    Ok(opts)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}: expected a number, got '{value}'")))
}

fn validate(opts: &SessionOptions) -> Result<()> {
    if opts.context_window == 0 {
        return Err(ConfigError::Invalid("context_window must be positive".to_string()));
    }
    if opts.watchdog.is_zero() {
        return Err(ConfigError::Invalid("watchdog must be positive".to_string()));
    }
    Ok(())
}
