//! Service configuration

use anyhow::{bail, Context, Result};
use idenclave_sdk::{StorageProvider, DEVNET_RPC_URL};
use solana_sdk::pubkey::Pubkey;

#[derive(Clone)]
pub struct Config {
    /// RPC endpoint to connect to
    pub rpc_url: String,

    /// WebSocket endpoint (reserved for subscription-based confirmation)
    pub ws_url: String,

    /// Identity/credential program ID
    pub program_id: Pubkey,

    /// Keypair backing the issuer wallet
    pub keypair_path: String,

    /// Pinning service configuration
    pub storage: StorageProvider,

    /// Confirmation poll interval (milliseconds)
    pub confirm_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let program_id = std::env::var("PROGRAM_ID")
            .context("PROGRAM_ID not set")?
            .parse()
            .context("Invalid PROGRAM_ID")?;

        let storage = match std::env::var("STORAGE_PROVIDER")
            .unwrap_or_else(|_| "bearer".to_string())
            .as_str()
        {
            "bearer" => StorageProvider::Bearer {
                endpoint: std::env::var("STORAGE_ENDPOINT")
                    .unwrap_or_else(|_| "https://api.nft.storage/upload".to_string()),
                api_key: std::env::var("STORAGE_API_KEY")
                    .context("STORAGE_API_KEY not set")?,
            },
            "basic" => StorageProvider::Basic {
                endpoint: std::env::var("STORAGE_ENDPOINT")
                    .unwrap_or_else(|_| "https://ipfs.infura.io:5001".to_string()),
                project_id: std::env::var("STORAGE_PROJECT_ID")
                    .context("STORAGE_PROJECT_ID not set")?,
                project_secret: std::env::var("STORAGE_PROJECT_SECRET")
                    .context("STORAGE_PROJECT_SECRET not set")?,
            },
            other => bail!("Unsupported STORAGE_PROVIDER: {other}"),
        };

        Ok(Config {
            rpc_url: std::env::var("RPC_URL").unwrap_or_else(|_| DEVNET_RPC_URL.to_string()),

            ws_url: std::env::var("WS_URL")
                .unwrap_or_else(|_| "wss://api.devnet.solana.com".to_string()),

            program_id,

            keypair_path: std::env::var("KEYPAIR_PATH")
                .unwrap_or_else(|_| "~/.config/solana/id.json".to_string()),

            storage,

            confirm_poll_ms: std::env::var("CONFIRM_POLL_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("Invalid CONFIRM_POLL_MS")?,
        })
    }
}
