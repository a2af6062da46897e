//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use examwatch_core::listing::ListingParser;
use url::Url;

/// Flat `key = value` file configuration.
///
/// Credentials are deliberately absent: they come from flags and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Public listing URL (offset 0).
    pub listing_url: Option<String>,
    /// Detail-link regex with one capture group for the entry id.
    pub detail_pattern: Option<String>,
    /// Member portal base URL.
    pub portal_url: Option<String>,
    /// Login form path on the portal.
    pub login_path: Option<String>,
    /// Exam table path on the portal.
    pub exams_path: Option<String>,
    /// Login form field for the username.
    pub username_field: Option<String>,
    /// Login form field for the password.
    pub password_field: Option<String>,
    /// Spacing between backfill page requests in milliseconds.
    pub page_delay_ms: Option<u64>,
    /// Timeout for pages and login in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Timeout for result documents in seconds.
    pub document_timeout_secs: Option<u64>,
    /// Directory holding the seen set and result cache.
    pub state_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_http_url("listing_url", self.listing_url.as_deref())?;
        validate_http_url("portal_url", self.portal_url.as_deref())?;
        validate_path("login_path", self.login_path.as_deref())?;
        validate_path("exams_path", self.exams_path.as_deref())?;
        validate_field_name("username_field", self.username_field.as_deref())?;
        validate_field_name("password_field", self.password_field.as_deref())?;

        if let Some(pattern) = self.detail_pattern.as_deref() {
            ListingParser::new(pattern).context("Invalid config value for `detail_pattern`")?;
        }

        if let Some(page_delay_ms) = self.page_delay_ms
            && page_delay_ms > 60_000
        {
            bail!(
                "Invalid config value for `page_delay_ms`: {page_delay_ms}. Expected range: 0..=60000"
            );
        }
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        validate_timeout_secs("document_timeout_secs", self.document_timeout_secs)?;

        Ok(())
    }
}

fn validate_http_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let parsed = Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

fn validate_path(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !value.starts_with('/') {
        bail!("Invalid config value for `{field}`: '{value}'. Expected a path starting with '/'");
    }
    Ok(())
}

fn validate_field_name(field: &str, value: Option<&str>) -> Result<()> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        bail!("Invalid config value for `{field}`: must not be empty");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// The parsed config, or defaults when no file was loaded.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/examwatch/config.toml`
/// 2. `$HOME/.config/examwatch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("examwatch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("examwatch")
            .join("config.toml"),
    )
}

/// Resolves the default state directory.
///
/// `$XDG_STATE_HOME/examwatch` when set, otherwise `./.examwatch`.
#[must_use]
pub fn resolve_default_state_dir() -> PathBuf {
    env_var_non_empty_os("XDG_STATE_HOME").map_or_else(
        || PathBuf::from(".examwatch"),
        |state_home| PathBuf::from(state_home).join("examwatch"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` (which must exist) or the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
            })
        }
        _ => Ok(LoadedConfig { path, config: None }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;
        let string_value = || {
            parse_string_literal(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_no}"))
        };
        let integer_value = || {
            parse_integer_u64(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_no}"))
        };

        match key {
            "listing_url" => cfg.listing_url = Some(string_value()?),
            "detail_pattern" => cfg.detail_pattern = Some(string_value()?),
            "portal_url" => cfg.portal_url = Some(string_value()?),
            "login_path" => cfg.login_path = Some(string_value()?),
            "exams_path" => cfg.exams_path = Some(string_value()?),
            "username_field" => cfg.username_field = Some(string_value()?),
            "password_field" => cfg.password_field = Some(string_value()?),
            "state_dir" => cfg.state_dir = Some(PathBuf::from(string_value()?)),
            "page_delay_ms" => cfg.page_delay_ms = Some(integer_value()?),
            "request_timeout_secs" => cfg.request_timeout_secs = Some(integer_value()?),
            "document_timeout_secs" => cfg.document_timeout_secs = Some(integer_value()?),
            "username" | "password" => {
                bail!(
                    "Credentials are not read from the config file (line {line_no}); use --username and EXAMWATCH_PASSWORD"
                );
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].replace("\\\\", "\\"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
