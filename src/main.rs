use secretsanta::{app, config, AppState, Config, Engine, EventStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let config = Config::from_env()?;

    let store = EventStore::connect(&config.database_url, config.max_connections, config.key_prefix.clone()).await?;
    store.migrate().await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("listening on {}, links point at {}", config.bind_addr, config.public_url);

    let app = app(AppState::new(Engine::new(store), config));
    axum::serve(listener, app).await?;

    Ok(())
}
