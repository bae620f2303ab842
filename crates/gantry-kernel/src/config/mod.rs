//! Configuration file loading.
//!
//! Gateway configuration (loaded plugins, cache lifetimes, seed rows) may be
//! written in YAML, TOML, JSON, INI, RON or JSON5.  The format is picked from
//! the file extension, `${VAR}` / `$VAR` references are replaced from the
//! process environment, and later sources override earlier ones when several
//! are layered.

use config::{Config as Cfg, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat as Format;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

/// Pick the file format from the extension of `path`.
///
/// ```rust,ignore
/// use gantry_kernel::config::{detect_format, Format};
///
/// assert_eq!(detect_format("gantry.yml").unwrap(), Format::Yaml);
/// ```
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat(format!("{path}: no file extension")))?;

    match ext.to_ascii_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Replace `${VAR}` and `$VAR` references with environment values.
///
/// Unset variables are left verbatim so the parse error points at them.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, env_value);
    BARE_VAR.replace_all(&braced, env_value).into_owned()
}

fn env_value(caps: &Captures<'_>) -> String {
    std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
}

fn with_source(
    builder: ConfigBuilder<DefaultState>,
    content: &str,
    format: FileFormat,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from_str(&substitute_env_vars(content), format))
}

fn finish<T: DeserializeOwned>(builder: ConfigBuilder<DefaultState>) -> ConfigResult<T> {
    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

fn read_source(path: &str) -> ConfigResult<(String, FileFormat)> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok((content, format))
}

/// Load and deserialize one configuration file.
pub fn load_config<T: DeserializeOwned>(path: &str) -> ConfigResult<T> {
    let (content, format) = read_source(path)?;
    finish(with_source(Cfg::builder(), &content, format))
}

/// Deserialize configuration held in memory.
pub fn from_str<T: DeserializeOwned>(content: &str, format: FileFormat) -> ConfigResult<T> {
    finish(with_source(Cfg::builder(), content, format))
}

/// Layer in-memory sources; later entries override earlier ones.
pub fn merge_configs<T: DeserializeOwned>(sources: &[(&str, FileFormat)]) -> ConfigResult<T> {
    let builder = sources
        .iter()
        .fold(Cfg::builder(), |b, (content, format)| {
            with_source(b, content, *format)
        });
    finish(builder)
}

/// Layer configuration files; later files override earlier ones.
pub fn load_merged<T: DeserializeOwned>(paths: &[&str]) -> ConfigResult<T> {
    let mut builder = Cfg::builder();
    for path in paths {
        let (content, format) = read_source(path)?;
        builder = with_source(builder, &content, format);
    }
    finish(builder)
}

/// Load a file, then apply `{PREFIX}_SECTION__KEY` environment overrides.
///
/// Override values are parsed as numbers or booleans where they look like
/// one.
pub fn load_with_env<T: DeserializeOwned>(path: &str, env_prefix: &str) -> ConfigResult<T> {
    let (content, format) = read_source(path)?;
    let env = Environment::with_prefix(env_prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);
    finish(with_source(Cfg::builder(), &content, format).add_source(env))
}
