//! RPC network seam

use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};

use crate::error::SubmissionError;

/// Devnet RPC endpoint used when no URL is configured
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Chain access required by the submitter and pipeline
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Latest blockhash and the block height at which it stops being valid
    async fn latest_blockhash(&self) -> Result<(Hash, u64), SubmissionError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmissionError>;

    /// `None` until the cluster has processed the signature; `Some(Err)`
    /// carries the execution failure reason.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), String>>, SubmissionError>;

    async fn block_height(&self) -> Result<u64, SubmissionError>;

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, SubmissionError>;
}

/// Production client backed by a JSON-RPC endpoint at confirmed commitment
pub struct RpcNetworkClient {
    rpc: RpcClient,
}

impl RpcNetworkClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            ),
        }
    }

    fn transport(err: solana_client::client_error::ClientError) -> SubmissionError {
        SubmissionError::Network {
            message: err.to_string(),
            signature: None,
        }
    }
}

#[async_trait]
impl NetworkClient for RpcNetworkClient {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), SubmissionError> {
        self.rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .map_err(Self::transport)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmissionError> {
        self.rpc.send_transaction(tx).map_err(Self::transport)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), String>>, SubmissionError> {
        let status = self
            .rpc
            .get_signature_status(signature)
            .map_err(Self::transport)?;
        Ok(status.map(|result| result.map_err(|err| err.to_string())))
    }

    async fn block_height(&self) -> Result<u64, SubmissionError> {
        self.rpc.get_block_height().map_err(Self::transport)
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, SubmissionError> {
        Ok(self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .map_err(Self::transport)?
            .value)
    }
}
