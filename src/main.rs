use std::sync::Arc;
use tracing::info;

use parlor::{
    api::ApiClient,
    app::App,
    bus::EventBus,
    config::{Config, StoreLocation},
    interface::shell::Shell,
    session::SessionContext,
    store::Store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let dotenv = dotenvy::dotenv();

    // Initialize logging with default filter if RUST_LOG is not set.
    // Logs go to stderr, the screen owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv {
        // It's not fatal if .env doesn't exist, but good to know
        info!("No .env file found or failed to load: {}", e);
    }

    let config = Config::from_env()?;
    info!("Parlor starting against {}", config.backend_url);

    let store = match &config.store {
        StoreLocation::File(path) => {
            info!("Initializing store at {}", path.display());
            let store = Store::new(path).await?;
            store.init().await?;
            store
        }
        StoreLocation::Memory => {
            info!("Using an in-memory store, the session will not survive exit");
            Store::in_memory().await?
        }
    };

    let bus = Arc::new(EventBus::new());
    let api = ApiClient::new(config.backend_url.clone(), config.request_timeout)?;
    let app = App::new(api, bus, SessionContext::new(store));
    let mut shell = Shell::new(app);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = shell.run(config.start.clone()) => {
            res?;
        }
    }

    Ok(())
}
