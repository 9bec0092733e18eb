use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use chakri::auth::jwt::JwtService;
use chakri::chat::ChatHub;
use chakri::config::AppConfig;
use chakri::mailer::SmtpMailer;
use chakri::routes;
use chakri::state::AppState;
use chakri::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        smtp_host = %config.smtp_host,
        "loaded configuration"
    );

    let store = PgStore::connect(&config.database_url, config.database_max_pool_size)?;
    store.run_migrations()?;

    let jwt = JwtService::from_config(&config);
    let mailer = Arc::new(SmtpMailer::from_config(&config)?);
    let chat = Arc::new(ChatHub::new());

    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;
    let state = AppState::new(Arc::new(store), config, jwt, mailer, chat);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
