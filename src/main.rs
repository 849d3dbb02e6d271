use forum_gateway::{
    AppState, JwtVerifier, UnimplementedControllers,
    auth::VerifierState,
    compose,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, composes the route table and
/// serves it. A composition failure (duplicate or malformed route) aborts
/// before the listener is bound.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "forum_gateway=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let verifier = Arc::new(JwtVerifier::from_config(&config)) as VerifierState;

    // Business controllers plug in here; until then every action answers 501.
    let routes = match compose(&config, verifier, &UnimplementedControllers) {
        Ok(routes) => routes,
        Err(e) => {
            tracing::error!(error = %e, "FATAL: route table composition failed");
            std::process::exit(1);
        }
    };

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(routes, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
