use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes restricted to the 'admin' role. Authentication comes from the
/// `AuthUser` extractor; the role check is explicit in each handler, which
/// answers 403-1 for any non-admin actor.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /posts/statistics
        // Aggregate counters: total, published, and listed post counts.
        .route("/posts/statistics", get(handlers::get_statistics))
}
