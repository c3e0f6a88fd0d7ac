use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any member with a valid bearer token. Every handler here
/// takes the `AuthUser` extractor, so an unauthenticated request is
/// rejected with 401-1 before the handler body runs, and the resolved
/// actor feeds the ownership checks in the access policy.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /posts/mine
        // The actor's own posts, drafts and unlisted ones included.
        .route("/posts/mine", get(handlers::get_my_posts))
        // POST /posts
        // Creates a post owned by the actor.
        .route("/posts", post(handlers::write_post))
        // PUT/DELETE /posts/{id}
        // Modify is author-only; delete is author-or-admin. Both checks
        // live in the access policy, applied in the handlers.
        .route(
            "/posts/{id}",
            put(handlers::modify_post).delete(handlers::delete_post),
        )
}
