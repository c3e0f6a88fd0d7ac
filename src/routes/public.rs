use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints accessible to any client, anonymous or logged-in.
///
/// The single-post route sits here because published posts are readable
/// without a token; its handler upgrades to required-auth plus the access
/// policy only when the post is private.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /posts?page=&pageSize=&keywordType=&keyword=
        // Paginated public listing; listed+published filter enforced in the
        // repository query.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Single post with content. Private posts require a token and pass
        // through the access policy.
        .route("/posts/{id}", get(handlers::get_post))
}
