//! Transaction assembly, signing, sending, and confirmation tracking.
//!
//! A submission walks a fixed state machine:
//! `Built -> BlockhashFetched -> Signed -> Sent -> Confirmed | Failed | TimedOut`.
//! One call produces at most one signed payload; re-sends re-broadcast that
//! exact payload and never re-sign.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{
    instruction::Instruction, signature::Signature, transaction::Transaction,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::network::NetworkClient;
use crate::wallet::WalletCapability;

/// Phases a submission passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Built,
    BlockhashFetched,
    Signed,
    Sent,
    Confirmed,
    Failed,
    TimedOut,
}

/// Record of a confirmed submission
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub signature: Signature,
    /// Every state the submission passed through, in order
    pub transitions: Vec<SubmissionState>,
}

/// Submission tuning knobs
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Broadcast attempts for one signed payload
    pub max_send_attempts: u32,
    /// Confirmation poll interval
    pub poll_interval: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_send_attempts: 3,
            poll_interval: Duration::from_millis(500),
        }
    }
}

pub struct TransactionSubmitter {
    network: Arc<dyn NetworkClient>,
    wallet: Arc<dyn WalletCapability>,
    config: SubmitterConfig,
}

impl TransactionSubmitter {
    pub fn new(network: Arc<dyn NetworkClient>, wallet: Arc<dyn WalletCapability>) -> Self {
        Self::with_config(network, wallet, SubmitterConfig::default())
    }

    pub fn with_config(
        network: Arc<dyn NetworkClient>,
        wallet: Arc<dyn WalletCapability>,
        config: SubmitterConfig,
    ) -> Self {
        Self {
            network,
            wallet,
            config,
        }
    }

    /// Drive one transaction through the full lifecycle. Cancellation takes
    /// effect at every suspension point; once the payload is sent the
    /// returned errors carry the signature for out-of-band status checks.
    pub async fn submit(
        &self,
        instructions: &[Instruction],
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if !self.wallet.supports_signing() {
            return Err(SubmissionError::SigningUnsupported);
        }

        let payer = self.wallet.public_address();
        let mut transitions = vec![SubmissionState::Built];
        let mut tx = Transaction::new_with_payer(instructions, Some(&payer));
        debug!(%payer, "transaction built");

        let (blockhash, last_valid_block_height) = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(SubmissionError::Cancelled { signature: None })
            }
            res = self.network.latest_blockhash() => res?,
        };
        tx.message.recent_blockhash = blockhash;
        transitions.push(SubmissionState::BlockhashFetched);
        debug!(%blockhash, last_valid_block_height, "blockhash fetched");

        let signed = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(SubmissionError::Cancelled { signature: None })
            }
            res = self.wallet.sign_transaction(tx) => res?,
        };
        transitions.push(SubmissionState::Signed);

        let signature = self.broadcast(&signed, cancel).await?;
        transitions.push(SubmissionState::Sent);
        info!(%signature, "transaction sent");

        self.await_confirmation(signature, last_valid_block_height, transitions, cancel)
            .await
    }

    /// Re-broadcast the signed payload up to the configured attempt count.
    /// The payload is never modified, so a duplicate landing twice resolves
    /// to the same signature.
    async fn broadcast(
        &self,
        signed: &Transaction,
        cancel: &CancellationToken,
    ) -> Result<Signature, SubmissionError> {
        let mut attempt = 1u32;
        loop {
            if cancel.is_cancelled() {
                return Err(SubmissionError::Cancelled { signature: None });
            }
            match self.network.send_transaction(signed).await {
                Ok(signature) => return Ok(signature),
                Err(SubmissionError::Network { message: reason, .. })
                    if attempt < self.config.max_send_attempts =>
                {
                    warn!(attempt, %reason, "send failed, re-broadcasting");
                    attempt += 1;
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            return Err(SubmissionError::Cancelled { signature: None })
                        }
                        () = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Poll for confirmation until the blockhash validity window closes
    async fn await_confirmation(
        &self,
        signature: Signature,
        last_valid_block_height: u64,
        mut transitions: Vec<SubmissionState>,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut poll_failures = 0u32;
        loop {
            let status = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(SubmissionError::Cancelled {
                        signature: Some(signature),
                    })
                }
                res = self.network.signature_status(&signature) => res,
            };

            match status {
                Ok(Some(Ok(()))) => {
                    transitions.push(SubmissionState::Confirmed);
                    info!(%signature, "transaction confirmed");
                    return Ok(SubmissionReceipt {
                        signature,
                        transitions,
                    });
                }
                Ok(Some(Err(reason))) => {
                    transitions.push(SubmissionState::Failed);
                    return Err(SubmissionError::ExecutionFailed { signature, reason });
                }
                Ok(None) => match self.network.block_height().await {
                    Ok(height) if height > last_valid_block_height => {
                        transitions.push(SubmissionState::TimedOut);
                        return Err(SubmissionError::TimedOut { signature });
                    }
                    Ok(_) => poll_failures = 0,
                    Err(err) => {
                        poll_failures += 1;
                        if poll_failures >= self.config.max_send_attempts {
                            return Err(with_signature(err, signature));
                        }
                        warn!(poll_failures, "block height lookup failed");
                    }
                },
                Err(err) => {
                    poll_failures += 1;
                    if poll_failures >= self.config.max_send_attempts {
                        return Err(with_signature(err, signature));
                    }
                    warn!(poll_failures, "status poll failed");
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(SubmissionError::Cancelled {
                        signature: Some(signature),
                    })
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}

/// Attach the sent signature to transport errors surfaced after the send
fn with_signature(err: SubmissionError, signature: Signature) -> SubmissionError {
    match err {
        SubmissionError::Network { message, .. } => SubmissionError::Network {
            message,
            signature: Some(signature),
        },
        other => other,
    }
}
