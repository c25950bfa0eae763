use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_rental_portal::{config::Config, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Upstream API at {}; guarding {:?} -> {}",
        config.api_base_url, config.protected_paths, config.guard_redirect_path
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;
    let app = routes::router(state);

    info!("car rental portal listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
