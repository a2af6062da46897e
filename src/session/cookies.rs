//! `Set-Cookie` scanning and `Cookie` header construction.

use tracing::trace;

use super::SESSION_COOKIE_NAME;

/// Returns the value of the first cookie called `name` across `set_cookie_values`.
///
/// Each item is one raw `Set-Cookie` header value
/// (`name=value; Path=/; HttpOnly`). Only the leading `name=value` pair is
/// considered; attributes are ignored. Matching on the name is exact, and
/// cookies with an empty value (the usual "delete this cookie" form) are skipped.
///
/// ```
/// use examwatch_core::session::find_cookie;
///
/// let headers = ["lang=id; path=/", "ci_session=abc123; expires=Thu, 01 Jan 2099 00:00:00 GMT; path=/"];
/// assert_eq!(find_cookie(headers, "ci_session"), Some("abc123"));
/// assert_eq!(find_cookie(["ci_session_old=x"], "ci_session"), None);
/// ```
#[must_use]
pub fn find_cookie<'a, I>(set_cookie_values: I, name: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    set_cookie_values.into_iter().find_map(|raw| {
        let pair = raw.split(';').next()?;
        let (cookie_name, value) = pair.split_once('=')?;
        if cookie_name.trim() != name {
            return None;
        }
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            trace!(cookie = name, "skipping empty cookie value");
            None
        } else {
            Some(value)
        }
    })
}

/// Builds the `Cookie` header value that carries a session token.
#[must_use]
pub fn session_cookie_header(token: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={token}")
}
