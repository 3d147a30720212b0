use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use sayings_image_api::{api, config};

#[tokio::main]
async fn main() {
    config::Config::dotenv_load();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = config::Config::new().expect("Failed to load configuration");
    config.log_summary();

    let state = Arc::new(
        api::AppState::from_config(&config)
            .await
            .expect("Failed to initialise storage"),
    );
    let app = api::router(state);

    // Run our application with safe parsing
    let ip: std::net::IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", config.api_host);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let socket_address = SocketAddr::new(ip, config.api_port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .expect("server error");
}
