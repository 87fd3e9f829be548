use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::api::auth::{credentials_valid, expired_session_cookie, session_cookie};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<JSend<LoginResponse>>), ApiError> {
    if !credentials_valid(&state, &body.username, &body.password) {
        tracing::warn!(username = %body.username, "Failed admin login");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    tracing::info!("Admin logged in");
    Ok((
        jar.add(session_cookie(&state)),
        JSend::success(LoginResponse {
            username: body.username,
        }),
    ))
}

/// Always succeeds, whether or not a session was present.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<JSend<()>>) {
    (jar.add(expired_session_cookie()), JSend::success(()))
}
