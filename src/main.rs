use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_bathtub::api;
use ai_bathtub::config::{Config, DEFAULT_SECRET_KEY};
use ai_bathtub::state::AppState;

#[derive(Parser)]
#[command(name = "ai-bathtub")]
#[command(about = "Watch your AI chat fill a bathtub: token, CO2 and water tracking")]
struct Cli {
    /// Port to listen on (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_bathtub=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // .env first, then the process environment
    dotenvy::dotenv().ok();
    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if config.secret_key == DEFAULT_SECRET_KEY {
        tracing::warn!("SECRET_KEY is not set; session cookies are signed with the demo default");
    }

    let port = config.port;
    let capacity = config.bathtub_capacity;
    let state = Arc::new(AppState::new(config).context("building application state")?);
    let app = api::routes::create_router(state);

    let addr = format!("{}:{}", cli.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("AI Bathtub running at http://{addr} (capacity: {capacity} tokens)");
    println!("\n  AI Bathtub is running!");
    println!("  Open http://localhost:{port} in your browser\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
