use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::auth::{require_admin_api, require_admin_page};
use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body cap for uploads; saturates instead of wrapping on huge limits.
fn upload_body_limit(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = upload_body_limit(state.config.max_upload_size);

    let api_guard = middleware::from_fn_with_state(Arc::clone(&state), require_admin_api);
    let page_guard = middleware::from_fn_with_state(Arc::clone(&state), require_admin_page);

    let admin_api = Router::new()
        .route(
            "/api/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/:slug", delete(handlers::delete_file))
        .route_layer(api_guard);

    let admin_pages = Router::new()
        .route("/", get(handlers::upload_page))
        .route("/admin", get(handlers::admin_page))
        .route_layer(page_guard);

    let public = Router::new()
        // Files
        .route("/api/files/:slug", get(handlers::serve_file))
        .route("/api/files/:slug/sheets", get(handlers::get_sheets))
        // Auth
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        // Pages
        .route("/login", get(handlers::login_page))
        .route("/:slug", get(handlers::viewer_page))
        // Internal
        .route("/_internal/health", get(handlers::health));

    admin_api
        .merge(admin_pages)
        .merge(public)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_adds_multipart_overhead() {
        assert_eq!(upload_body_limit(1024), 1024 + MULTIPART_OVERHEAD);
    }

    #[test]
    fn upload_limit_saturates() {
        assert_eq!(upload_body_limit(u64::MAX), usize::MAX);
        assert_eq!(
            upload_body_limit((usize::MAX - 1) as u64),
            usize::MAX
        );
    }
}
