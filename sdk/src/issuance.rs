//! End-to-end issuance pipeline.
//!
//! One strictly sequential flow per operation: validate, upload, derive,
//! encode, submit. An in-flight lock serializes attempts from the same
//! pipeline so one logical credential cannot double-upload or race itself
//! onto the chain. Every operation is an independent, cancellable unit of
//! work; before the send no on-chain effect exists to roll back.

use std::sync::Arc;

use chrono::Utc;
use solana_sdk::{account::Account, pubkey::Pubkey};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::accounts;
use crate::credential::CredentialDraft;
use crate::error::IssuanceError;
use crate::instruction::{self, IssuePayload};
use crate::network::NetworkClient;
use crate::pda::PdaDeriver;
use crate::storage::ContentStore;
use crate::submit::{SubmissionReceipt, SubmitterConfig, TransactionSubmitter};
use crate::types::{ContentReference, CredentialAccount, IdentityAccount, IssuanceOutcome};
use crate::wallet::WalletCapability;

pub struct IssuancePipeline {
    program_id: Pubkey,
    network: Arc<dyn NetworkClient>,
    wallet: Arc<dyn WalletCapability>,
    store: Arc<dyn ContentStore>,
    submitter: TransactionSubmitter,
    in_flight: Mutex<()>,
}

impl IssuancePipeline {
    pub fn new(
        program_id: Pubkey,
        network: Arc<dyn NetworkClient>,
        wallet: Arc<dyn WalletCapability>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        let submitter = TransactionSubmitter::new(Arc::clone(&network), Arc::clone(&wallet));
        Self {
            program_id,
            network,
            wallet,
            store,
            submitter,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_submitter_config(mut self, config: SubmitterConfig) -> Self {
        self.submitter = TransactionSubmitter::with_config(
            Arc::clone(&self.network),
            Arc::clone(&self.wallet),
            config,
        );
        self
    }

    /// Issue a credential: validate the draft, pin the canonical encoding,
    /// derive the account addresses, and submit the issuance instruction.
    /// Aborts before any on-chain interaction if validation or the upload
    /// fails.
    pub async fn issue(
        &self,
        draft: &CredentialDraft,
        cancel: &CancellationToken,
    ) -> Result<IssuanceOutcome, IssuanceError> {
        let _guard = self.in_flight.lock().await;
        if cancel.is_cancelled() {
            return Err(IssuanceError::Cancelled);
        }

        let issuer = self.wallet.public_address();
        let now = Utc::now().timestamp();
        let mut credential = draft.build(now)?;
        credential.issuer = Some(issuer);
        let bytes = credential.canonical_bytes()?;
        debug!(len = bytes.len(), "credential serialized");

        let cid = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(IssuanceError::Cancelled),
            res = self.store.upload(bytes) => res?,
        };
        info!(%cid, "credential pinned");

        let content_ref = ContentReference::from_identifier(&cid);
        let (identity_address, _) = PdaDeriver::derive_identity(&issuer, &self.program_id);
        let (credential_address, _) =
            PdaDeriver::derive_credential(&content_ref, &self.program_id);

        if self.fetch_raw(&identity_address, cancel).await?.is_none() {
            return Err(IssuanceError::IdentityNotRegistered { wallet: issuer });
        }

        let payload = IssuePayload {
            content_ref,
            issued_at: credential.issued_at,
            expires_at: credential.expires_at,
        };
        let ix = instruction::issue_credential(
            &self.program_id,
            &identity_address,
            &credential_address,
            &issuer,
            &payload,
        );
        let receipt = self.submitter.submit(&[ix], cancel).await?;
        info!(signature = %receipt.signature, address = %credential_address, "credential issued");

        Ok(IssuanceOutcome {
            cid,
            content_ref,
            credential_address,
            signature: receipt.signature,
            receipt,
        })
    }

    /// Create the identity account for the connected wallet. The account's
    /// existence is the registration signal, so registering twice fails
    /// before any transaction is built.
    pub async fn register_identity(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, IssuanceError> {
        let _guard = self.in_flight.lock().await;
        let authority = self.wallet.public_address();
        let (identity_address, _) = PdaDeriver::derive_identity(&authority, &self.program_id);

        if self.fetch_raw(&identity_address, cancel).await?.is_some() {
            return Err(IssuanceError::AlreadyRegistered { wallet: authority });
        }

        let ix = instruction::register_identity(&self.program_id, &identity_address, &authority);
        let receipt = self.submitter.submit(&[ix], cancel).await?;
        info!(signature = %receipt.signature, address = %identity_address, "identity registered");
        Ok(receipt)
    }

    /// Mark an issued credential revoked
    pub async fn revoke_credential(
        &self,
        content_ref: &ContentReference,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, IssuanceError> {
        let _guard = self.in_flight.lock().await;
        let issuer = self.wallet.public_address();
        let (credential_address, _) =
            PdaDeriver::derive_credential(content_ref, &self.program_id);

        if self.fetch_raw(&credential_address, cancel).await?.is_none() {
            return Err(IssuanceError::CredentialNotFound {
                address: credential_address,
            });
        }

        let ix = instruction::revoke_credential(&self.program_id, &credential_address, &issuer);
        let receipt = self.submitter.submit(&[ix], cancel).await?;
        info!(signature = %receipt.signature, address = %credential_address, "credential revoked");
        Ok(receipt)
    }

    /// Close a credential account and reclaim its rent
    pub async fn close_credential(
        &self,
        content_ref: &ContentReference,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, IssuanceError> {
        let _guard = self.in_flight.lock().await;
        let issuer = self.wallet.public_address();
        let (credential_address, _) =
            PdaDeriver::derive_credential(content_ref, &self.program_id);

        if self.fetch_raw(&credential_address, cancel).await?.is_none() {
            return Err(IssuanceError::CredentialNotFound {
                address: credential_address,
            });
        }

        let ix = instruction::close_credential(&self.program_id, &credential_address, &issuer);
        let receipt = self.submitter.submit(&[ix], cancel).await?;
        info!(signature = %receipt.signature, address = %credential_address, "credential closed");
        Ok(receipt)
    }

    /// Close the wallet's identity account and reclaim its rent
    pub async fn close_identity(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, IssuanceError> {
        let _guard = self.in_flight.lock().await;
        let authority = self.wallet.public_address();
        let (identity_address, _) = PdaDeriver::derive_identity(&authority, &self.program_id);

        if self.fetch_raw(&identity_address, cancel).await?.is_none() {
            return Err(IssuanceError::IdentityNotRegistered { wallet: authority });
        }

        let ix = instruction::close_identity(&self.program_id, &identity_address, &authority);
        let receipt = self.submitter.submit(&[ix], cancel).await?;
        info!(signature = %receipt.signature, address = %identity_address, "identity closed");
        Ok(receipt)
    }

    /// Fetch and decode the identity account for a wallet, if registered
    pub async fn fetch_identity(
        &self,
        wallet: &Pubkey,
    ) -> Result<Option<IdentityAccount>, IssuanceError> {
        let (address, _) = PdaDeriver::derive_identity(wallet, &self.program_id);
        let account = self.network.get_account(&address).await?;
        Ok(account.and_then(|account| accounts::parse_identity(&account.data)))
    }

    /// Fetch and decode a credential account, if it exists
    pub async fn fetch_credential(
        &self,
        content_ref: &ContentReference,
    ) -> Result<Option<CredentialAccount>, IssuanceError> {
        let (address, _) = PdaDeriver::derive_credential(content_ref, &self.program_id);
        let account = self.network.get_account(&address).await?;
        Ok(account.and_then(|account| accounts::parse_credential(&account.data)))
    }

    async fn fetch_raw(
        &self,
        address: &Pubkey,
        cancel: &CancellationToken,
    ) -> Result<Option<Account>, IssuanceError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(IssuanceError::Cancelled),
            res = self.network.get_account(address) => Ok(res?),
        }
    }
}
