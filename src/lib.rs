use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the entry point and tests.
pub use config::AppConfig;
pub use error::ServiceError;
pub use repository::{MockRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generated OpenAPI documentation, aggregating every handler
/// decorated with `#[utoipa::path]` and the DTO schemas. Served as JSON at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_posts, handlers::get_my_posts, handlers::get_post,
        handlers::write_post, handlers::modify_post, handlers::delete_post,
        handlers::get_statistics
    ),
    components(
        schemas(
            models::PostDto, models::PostWithContentDto, models::PageDto,
            models::WritePostRequest, models::ModifyPostRequest,
            models::PostStatisticsDto,
        )
    ),
    tags(
        (name = "blog-api", description = "Blog Post API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding all shared services and
/// configuration, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (notably AuthUser) pull individual components out of the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's routing structure, applies the
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    // The three access-level routers share paths with disjoint methods
    // (e.g. GET /posts is public, POST /posts requires auth), so they
    // merge into one route table.
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request tracing: wraps the request/response lifecycle in a
                // span keyed by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Request ID propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: includes the `x-request-id` header in the
/// structured logging metadata alongside the HTTP method and URI, so every
/// log line of a request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
