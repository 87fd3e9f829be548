//! Admin authentication: a session cookie issued by the login endpoint, or
//! HTTP Basic credentials for scripted access.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use base64::Engine;
use serde::Serialize;

use crate::api::response::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "admin_session";
const BASIC_CHALLENGE: &str = "Basic realm=\"Admin Area\"";

fn constant_time_eq(a: &str, b: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(a.as_bytes(), b.as_bytes()).is_ok()
}

/// Check a username/password pair against the configured admin credentials.
pub fn credentials_valid(state: &AppState, username: &str, password: &str) -> bool {
    let auth = &state.config.auth;
    let username_ok = constant_time_eq(username, &auth.admin_username);
    let password_ok = constant_time_eq(password, &auth.admin_password);
    username_ok & password_ok
}

fn basic_auth_valid(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
    else {
        return false;
    };

    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };

    match credentials.split_once(':') {
        Some((username, password)) => credentials_valid(state, username, password),
        None => false,
    }
}

fn session_valid(state: &AppState, headers: &HeaderMap) -> bool {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| constant_time_eq(cookie.value(), &state.session_token))
}

/// True when the request carries a valid session cookie or Basic credentials.
pub fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    session_valid(state, headers) || basic_auth_valid(state, headers)
}

/// The cookie handed out on successful login.
pub fn session_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, state.session_token.clone()))
        .http_only(true)
        .secure(state.config.auth.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(24))
        .build()
}

/// A cookie that clears the session on the client.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Guard for admin API routes: 401 with a Basic challenge when unauthenticated.
pub async fn require_admin_api(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if is_admin(&state, request.headers()) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated API request");
    let mut response = ApiError::unauthorized("Authentication required").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(BASIC_CHALLENGE),
    );
    response
}

#[derive(Serialize)]
struct LoginRedirect<'a> {
    next: &'a str,
}

/// Guard for admin pages: redirect to the login page when unauthenticated.
pub async fn require_admin_page(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if is_admin(&state, request.headers()) {
        return next.run(request).await;
    }

    let path = request.uri().path();
    let query = serde_qs::to_string(&LoginRedirect { next: path }).unwrap_or_default();
    Redirect::to(&format!("/login?{query}")).into_response()
}

/// Only same-site absolute paths are allowed as post-login destinations.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path.to_string()
        }
        _ => "/admin".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/admin")), "/admin");
        assert_eq!(safe_next(Some("/")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/admin");
        assert_eq!(safe_next(Some("/\\evil.example")), "/admin");
        assert_eq!(safe_next(Some("https://evil.example")), "/admin");
        assert_eq!(safe_next(None), "/admin");
    }

    #[test]
    fn constant_time_eq_compares_content() {
        assert!(constant_time_eq("token", "token"));
        assert!(!constant_time_eq("token", "tokem"));
        assert!(!constant_time_eq("token", "token2"));
    }
}
