use url::Url;

use crate::http::FetchError;
use crate::session::LoginForm;

/// Login path used when none is configured.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Exam table path used when none is configured.
pub const DEFAULT_EXAMS_PATH: &str = "/peserta/ujian";

/// Where the member portal lives and how its login form looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Portal origin, e.g. `https://portal.example`.
    pub base_url: Url,
    /// Path of the login form; also the marker of a login redirect.
    pub login_path: String,
    /// Path of the member exam table.
    pub exams_path: String,
    /// Form field carrying the username.
    pub username_field: String,
    /// Form field carrying the password.
    pub password_field: String,
}

impl PortalConfig {
    /// Settings for the portal at `base_url` with default paths and field names.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            exams_path: DEFAULT_EXAMS_PATH.to_string(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
        }
    }

    /// Absolute login URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the path cannot be joined.
    pub fn login_url(&self) -> Result<Url, FetchError> {
        self.resolve(&self.login_path)
    }

    /// Absolute exam table URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the path cannot be joined.
    pub fn exams_url(&self) -> Result<Url, FetchError> {
        self.resolve(&self.exams_path)
    }

    /// The login form description for the authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the login URL cannot be built.
    pub fn login_form(&self) -> Result<LoginForm, FetchError> {
        Ok(LoginForm {
            url: self.login_url()?.to_string(),
            username_field: self.username_field.clone(),
            password_field: self.password_field.clone(),
        })
    }

    /// Whether `url` is the login page: its path contains the login path as
    /// whole segments (`/login`, `/auth/login`, `/login/`, not `/login-history`).
    #[must_use]
    pub fn is_login_page(&self, url: &Url) -> bool {
        let marker = self.login_path.trim_end_matches('/');
        if marker.is_empty() {
            return url.path() == "/";
        }
        let path = url.path();
        path.match_indices(marker).any(|(start, _)| {
            let before_ok = marker.starts_with('/') || start == 0 || path[..start].ends_with('/');
            let rest = &path[start + marker.len()..];
            before_ok && (rest.is_empty() || rest.starts_with('/'))
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|_| FetchError::invalid_url(format!("{}{path}", self.base_url)))
    }
}
