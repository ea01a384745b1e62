use actix_web::HttpServer;
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use shelf_api::{create_app, telemetry, Gatekeeper};
use shelf_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging)?;

    info!(
        environment = %config.environment,
        rate_limit_enabled = config.rate_limit.enabled,
        capacity = config.rate_limit.capacity,
        refill_rate = config.rate_limit.refill_rate,
        "Starting Shelf API server"
    );

    let gatekeeper = Gatekeeper::from_config(&config).context("failed to build gatekeeper")?;
    let sweeper = gatekeeper.spawn_sweeper();

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let app_gatekeeper = gatekeeper.clone();
    let mut server = HttpServer::new(move || create_app(app_gatekeeper.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await;

    sweeper.shutdown().await;
    info!(visitors = gatekeeper.registry().len(), "Server stopped");

    result.context("server error")
}
