//! Issuer service binary

use anyhow::Result;
use idenclave_issuer::{parse_args, run, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Required configuration is validated before anything touches the network
    let config = Config::from_env()?;
    info!(
        rpc_url = %config.rpc_url,
        ws_url = %config.ws_url,
        program_id = %config.program_id,
        "issuer configured"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    run(config, command).await
}
