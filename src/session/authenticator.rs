//! The login exchange.

use std::time::SystemTime;

use tracing::{info, instrument, warn};

use super::{AuthError, Credentials, SESSION_COOKIE_NAME, SESSION_LIFETIME, Session, find_cookie};
use crate::http::HttpClient;

/// Where and how the login form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Absolute URL the form is POSTed to.
    pub url: String,
    /// Form field carrying the username.
    pub username_field: String,
    /// Form field carrying the password.
    pub password_field: String,
}

impl LoginForm {
    /// A form at `url` with the default `username`/`password` field names.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
        }
    }
}

/// Performs the portal login and turns the issued cookie into a [`Session`].
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: HttpClient,
    form: LoginForm,
}

impl Authenticator {
    /// Creates an authenticator that submits `form` through `http`.
    #[must_use]
    pub fn new(http: HttpClient, form: LoginForm) -> Self {
        Self { http, form }
    }

    /// Returns the login form description.
    #[must_use]
    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    /// Logs `identity` in with `credentials`.
    ///
    /// The POST is not redirect-followed; the session cookie is read from the
    /// response itself. The session is assumed to live for
    /// [`SESSION_LIFETIME`] from now.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] when the response carries no `ci_session` cookie
    /// - [`AuthError::Transport`] when the request could not be completed
    #[instrument(skip(self, credentials), fields(identity = %identity, url = %self.form.url))]
    pub async fn login(
        &self,
        identity: &str,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let form = [
            (self.form.username_field.as_str(), credentials.username()),
            (self.form.password_field.as_str(), credentials.password()),
        ];
        let response = self
            .http
            .post_form(&self.form.url, &form, Some(&self.form.url))
            .await?;

        let Some(token) = find_cookie(response.header_values("set-cookie"), SESSION_COOKIE_NAME)
        else {
            warn!(status = response.status, "login rejected: no session cookie issued");
            return Err(AuthError::rejected(identity, response.status));
        };

        let session = Session::new(token, SystemTime::now() + SESSION_LIFETIME);
        info!(
            status = response.status,
            redirect = response.is_redirect(),
            "login succeeded"
        );
        Ok(session)
    }
}
