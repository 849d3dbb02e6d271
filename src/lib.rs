use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Routing core: compiled patterns, the registry, and the chain executor.
pub mod chain;
pub mod dispatch;
pub mod pattern;
pub mod registry;

// Identity: bearer credentials and the two auth predicates.
pub mod auth;

// Business-layer seam and the ambient pieces.
pub mod config;
pub mod controllers;
pub mod docs;
pub mod error;

// Route groups (Public, Forum, Admin) and their composition.
pub mod routes;

// --- Public Re-exports ---

pub use auth::{AdminRequired, IdentityClaim, JwtVerifier, SignedInRequired, VerifierState};
pub use chain::{BoxHandler, Handler, Outcome, RequestContext};
pub use config::AppConfig;
pub use controllers::{Action, Controllers, UnimplementedControllers};
pub use error::{DispatchError, HandlerError, RouteError};
pub use registry::{Route, RouteTable};
pub use routes::compose;

/// AppState
///
/// The state shared by every request. It holds two things, both built
/// once during startup and never mutated afterwards:
///
/// * the composed `RouteTable`, behind an `Arc` so each request clones a
///   pointer rather than the table, and
/// * the loaded `AppConfig`.
///
/// Since nothing in here changes once the listener is bound, concurrent
/// requests read it without locks. Components pull only the piece they need
/// through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Registry: every (method, pattern) binding with its handler chain.
    pub routes: Arc<RouteTable>,
    /// Configuration: the environment as read at startup.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(routes: RouteTable, config: AppConfig) -> Self {
        Self {
            routes: Arc::new(routes),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// The dispatcher extracts only the route table; anything that needs settings
// extracts only the config.

impl FromRef<AppState> for Arc<RouteTable> {
    fn from_ref(app_state: &AppState) -> Arc<RouteTable> {
        Arc::clone(&app_state.routes)
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Wraps the composed route table in the HTTP service.
///
/// axum itself only serves the documentation routes. Every other request
/// lands in the `dispatch` fallback, which resolves it against our own
/// `RouteTable` and runs the matched handler chain. This keeps literal
/// precedence, the 404/405 split and the predicate ordering under our control
/// instead of the framework's.
///
/// The OpenAPI document is generated from the same table before the state is
/// moved into the router, so the docs list exactly the routes being served.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: the forum front-end is served from another origin.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Documentation, generated from the table.
    let openapi = docs::openapi(&state.routes);

    // 3. Router assembly: Swagger UI first, the registry dispatcher for the rest.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .fallback(dispatch::dispatch)
        .with_state(state);

    // 4. Observability, wrapping the dispatcher.
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Give each request a UUID unless the caller already sent one.
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 4b. One span per request, tagged with that id, closed with the
                // status and latency at INFO.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Echo the id back so clients can quote it in bug reports.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS outermost, so preflight requests never reach the dispatcher.
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `http_request` span for `TraceLayer`. Handler and predicate
/// events logged while the chain runs (rejections, handler failures) nest
/// under it, so one `req_id` ties together everything a request produced.
/// Requests that somehow arrive without an id are logged as `unknown`.
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
