//! CLI command handlers.

mod exams;
mod listing;
mod result;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use examwatch_core::http::constants::{DOCUMENT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use examwatch_core::http::{HttpClient, HttpSettings};
use examwatch_core::portal::{AuthenticatedFetcher, PortalClient, PortalConfig};
use examwatch_core::session::{Credentials, SessionStore};
use url::Url;

use crate::app_config::{FileConfig, resolve_default_state_dir};
use crate::cli::{Args, PortalArgs};

pub use exams::run_exams_command;
pub use listing::run_listing_command;
pub use result::run_result_command;

/// Environment variable holding the portal username when `--username` is absent.
pub const USERNAME_ENV: &str = "EXAMWATCH_USERNAME";

/// Environment variable holding the portal password.
pub const PASSWORD_ENV: &str = "EXAMWATCH_PASSWORD";

/// Settings shared by every command, resolved from flags and the config file.
#[derive(Debug)]
pub struct RunContext {
    pub file: FileConfig,
    pub json: bool,
    pub quiet: bool,
    pub state_dir: PathBuf,
    pub http: HttpClient,
}

impl RunContext {
    /// Resolves flags over file values over built-in defaults.
    pub fn new(args: &Args, file: FileConfig) -> Result<Self> {
        let request_timeout = args
            .request_timeout
            .or(file.request_timeout_secs)
            .unwrap_or(REQUEST_TIMEOUT_SECS);
        let document_timeout = file.document_timeout_secs.unwrap_or(DOCUMENT_TIMEOUT_SECS);
        let http = HttpClient::with_settings(HttpSettings {
            request_timeout: Duration::from_secs(request_timeout),
            document_timeout: Duration::from_secs(document_timeout),
            ..HttpSettings::default()
        })
        .context("Failed to build HTTP client")?;

        let state_dir = args
            .state_dir
            .clone()
            .or_else(|| file.state_dir.clone())
            .unwrap_or_else(resolve_default_state_dir);

        Ok(Self {
            file,
            json: args.json,
            quiet: args.quiet,
            state_dir,
            http,
        })
    }

    /// Whether an interactive progress bar may be drawn.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Builds the portal client and the identity/credentials to use with it.
    pub fn portal(&self, args: &PortalArgs) -> Result<(PortalClient, String, Credentials)> {
        let raw_url = args
            .portal_url
            .clone()
            .or_else(|| self.file.portal_url.clone())
            .ok_or_else(|| {
                anyhow!("No portal URL: pass --portal-url or set `portal_url` in the config file")
            })?;
        let base_url =
            Url::parse(&raw_url).with_context(|| format!("Invalid portal URL '{raw_url}'"))?;

        let mut config = PortalConfig::new(base_url);
        if let Some(path) = &self.file.login_path {
            config.login_path.clone_from(path);
        }
        if let Some(path) = &self.file.exams_path {
            config.exams_path.clone_from(path);
        }
        if let Some(field) = &self.file.username_field {
            config.username_field.clone_from(field);
        }
        if let Some(field) = &self.file.password_field {
            config.password_field.clone_from(field);
        }

        let credentials = resolve_credentials(args.username.as_deref())?;
        let identity = credentials.username().to_string();
        let fetcher =
            AuthenticatedFetcher::new(self.http.clone(), config, Arc::new(SessionStore::new()))?;
        Ok((PortalClient::new(fetcher), identity, credentials))
    }
}

fn resolve_credentials(username: Option<&str>) -> Result<Credentials> {
    let username = match username {
        Some(name) => name.to_string(),
        None => env::var(USERNAME_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("No portal username: pass --username or set {USERNAME_ENV}"))?,
    };
    let password = env::var(PASSWORD_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("No portal password: set {PASSWORD_ENV}"))?;
    Ok(Credentials::new(username, password))
}
