use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reviewgen::{AppState, Config, Orchestrator, ProfileStore};

#[derive(Parser, Debug)]
#[command(name = "reviewgen")]
#[command(version = "0.1.0")]
#[command(about = "Multi-tenant review generation service with LLM-backed drafting")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Database path for business profiles
    #[arg(long, default_value = "reviewgen.db")]
    database: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("reviewgen=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    if !config.has_any_provider() {
        tracing::warn!("No provider API keys configured; every generation request will fail");
    }

    let store = Arc::new(ProfileStore::new(&args.database)?);
    let orchestrator = Arc::new(Orchestrator::new(&config));
    let state = AppState {
        orchestrator,
        store,
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    reviewgen::server::serve(addr, state).await?;

    Ok(())
}
