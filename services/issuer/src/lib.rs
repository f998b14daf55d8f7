//! Headless issuer service.
//!
//! Drives the issuance pipeline with a file-based keypair wallet:
//! - Register or close the wallet's identity account
//! - Issue, revoke, and close credentials
//! - Inspect on-chain identity and credential state

pub mod config;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use idenclave_sdk::{
    ContentReference, CredentialDraft, IssuancePipeline, KeypairWallet, RpcNetworkClient,
    StorageUploader, SubmitterConfig, WalletCapability,
};
use solana_sdk::pubkey::Pubkey;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use config::Config;

const USAGE: &str = "usage: idenclave-issuer <command>
  register
  issue <type> <key=value>... [--expires-in-days N | --expires-at RFC3339]
  revoke <content-ref>
  close-credential <content-ref>
  close-identity
  status [wallet]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register,
    Issue {
        credential_type: String,
        claims: BTreeMap<String, String>,
        expires_at: i64,
    },
    Revoke { content_ref: ContentReference },
    CloseCredential { content_ref: ContentReference },
    CloseIdentity,
    Status { wallet: Option<Pubkey> },
}

/// Parse command-line arguments (the binary name already stripped)
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(command) = args.first() else {
        bail!("{USAGE}");
    };
    match command.as_str() {
        "register" => Ok(Command::Register),
        "issue" => parse_issue(&args[1..]),
        "revoke" => Ok(Command::Revoke {
            content_ref: parse_content_ref(args.get(1))?,
        }),
        "close-credential" => Ok(Command::CloseCredential {
            content_ref: parse_content_ref(args.get(1))?,
        }),
        "close-identity" => Ok(Command::CloseIdentity),
        "status" => {
            let wallet = args
                .get(1)
                .map(|s| s.parse().context("Invalid wallet address"))
                .transpose()?;
            Ok(Command::Status { wallet })
        }
        other => bail!("Unknown command {other}\n{USAGE}"),
    }
}

fn parse_issue(args: &[String]) -> Result<Command> {
    let Some(credential_type) = args.first() else {
        bail!("issue requires a credential type\n{USAGE}");
    };
    let mut claims = BTreeMap::new();
    let mut expires_at = None;
    let mut expires_in_days: i64 = 365;

    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--expires-at" => {
                let value = iter.next().context("--expires-at needs a value")?;
                expires_at = Some(
                    chrono::DateTime::parse_from_rfc3339(value)
                        .context("Invalid --expires-at, expected RFC 3339")?
                        .timestamp(),
                );
            }
            "--expires-in-days" => {
                expires_in_days = iter
                    .next()
                    .context("--expires-in-days needs a value")?
                    .parse()
                    .context("Invalid --expires-in-days")?;
            }
            pair => {
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("Claims must be key=value, got {pair}"))?;
                claims.insert(key.to_string(), value.to_string());
            }
        }
    }

    let expires_at =
        expires_at.unwrap_or_else(|| Utc::now().timestamp() + expires_in_days * 86_400);
    Ok(Command::Issue {
        credential_type: credential_type.clone(),
        claims,
        expires_at,
    })
}

fn parse_content_ref(arg: Option<&String>) -> Result<ContentReference> {
    arg.context("a base58 content reference is required")?
        .parse()
        .context("Invalid content reference")
}

/// Run one command against the configured cluster and storage service
pub async fn run(config: Config, command: Command) -> Result<()> {
    let wallet = Arc::new(KeypairWallet::from_file(&config.keypair_path)?);
    let network = Arc::new(RpcNetworkClient::new(&config.rpc_url));
    let uploader = Arc::new(StorageUploader::new(config.storage.clone())?);

    let pipeline = IssuancePipeline::new(config.program_id, network, wallet.clone(), uploader)
        .with_submitter_config(SubmitterConfig {
            poll_interval: Duration::from_millis(config.confirm_poll_ms),
            ..SubmitterConfig::default()
        });

    // Ctrl-C aborts the in-flight operation cleanly
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match command {
        Command::Register => {
            let receipt = pipeline.register_identity(&cancel).await?;
            println!("Identity registered in tx {}", receipt.signature);
        }
        Command::Issue {
            credential_type,
            claims,
            expires_at,
        } => {
            let draft = CredentialDraft {
                credential_type,
                claims,
                expires_at: Some(expires_at),
            };
            let outcome = pipeline.issue(&draft, &cancel).await?;
            println!("Credential pinned at {}", outcome.cid);
            println!("Content reference: {}", outcome.content_ref);
            println!("Credential account: {}", outcome.credential_address);
            println!("Issued in tx {}", outcome.signature);
        }
        Command::Revoke { content_ref } => {
            let receipt = pipeline.revoke_credential(&content_ref, &cancel).await?;
            println!("Credential revoked in tx {}", receipt.signature);
        }
        Command::CloseCredential { content_ref } => {
            let receipt = pipeline.close_credential(&content_ref, &cancel).await?;
            println!("Credential closed in tx {}", receipt.signature);
        }
        Command::CloseIdentity => {
            let receipt = pipeline.close_identity(&cancel).await?;
            println!("Identity closed in tx {}", receipt.signature);
        }
        Command::Status { wallet: target } => {
            let target = target.unwrap_or_else(|| wallet.public_address());
            match pipeline.fetch_identity(&target).await? {
                Some(identity) => {
                    info!(wallet = %target, "identity account found");
                    println!("Identity registered for {target}");
                    println!("  authority: {}", identity.authority);
                    if let Some(recovery) = identity.recovery {
                        println!("  recovery:  {recovery}");
                    }
                    if !identity.attributes.is_empty() {
                        println!("  attributes: {} bytes", identity.attributes.len());
                    }
                }
                None => println!("No identity registered for {target}"),
            }
        }
    }

    Ok(())
}
