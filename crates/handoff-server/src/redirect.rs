//! Redirect targets for the browser-facing endpoints.

use axum::response::{IntoResponse, Redirect, Response};

/// Redirect to the login page carrying an error code.
pub fn to_login(login_path: &str, error: &str) -> Response {
    let separator = if login_path.contains('?') { '&' } else { '?' };
    let target = format!(
        "{login_path}{separator}error={}",
        urlencoding::encode(error)
    );
    Redirect::to(&target).into_response()
}

/// Honour `requested` only if it is a same-site relative path.
///
/// Absolute URLs, scheme-relative `//host` forms and anything with control
/// characters fall back to `default`.
pub fn safe_return_to(requested: Option<&str>, default: &str) -> String {
    match requested.map(str::trim) {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => default.to_string(),
    }
}

/// Fill the `{token}` placeholder of an outbound redirect template.
pub fn fill_template(template: &str, token: &str) -> String {
    template.replace("{token}", &urlencoding::encode(token))
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(|c| c.is_control())
}
