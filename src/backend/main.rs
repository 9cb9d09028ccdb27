/**
 * fieldops-sync Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads `Settings` from the environment
 * and serves the sync API.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use fieldops_sync::shared::Settings;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,fieldops_sync=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = Settings::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    let port = settings.server_port;

    let app = fieldops_sync::backend::server::create_app(settings).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin fieldops-sync-server --features ssr");
    std::process::exit(1);
}
