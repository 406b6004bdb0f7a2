use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use consultation_cell::services::MeetingRegistry;
use invitation_cell::services::{
    transport_from_config, DispatchLog, InMemoryDispatchLog, InvitationDispatcher, RedisDispatchLog,
};
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting teleconsultation API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Consultation scheduling
    let registry = Arc::new(MeetingRegistry::from_config(&config));

    // Invitation delivery
    let dispatch_log = dispatch_log_from_config(&config).await;
    let dispatcher = Arc::new(InvitationDispatcher::new(
        registry.clone(),
        transport_from_config(&config),
        dispatch_log,
        &config,
    ));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(registry, dispatcher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn dispatch_log_from_config(config: &AppConfig) -> Arc<dyn DispatchLog> {
    if let Some(url) = &config.redis_url {
        match RedisDispatchLog::new(url).await {
            Ok(log) => return Arc::new(log),
            Err(e) => warn!("Redis dispatch log unavailable ({}), falling back to memory", e),
        }
    }

    info!("Using in-memory invitation dispatch log");
    Arc::new(InMemoryDispatchLog::new())
}
