//! Client SDK for the idenclave identity and credential programs
//!
//! One correct implementation of the credential issuance workflow:
//! - Credential construction and validation
//! - Content-addressed uploads to a pinning service
//! - Program-derived address computation
//! - Canonical instruction encoding
//! - Transaction submission and confirmation tracking
//!
//! Wallet and network access are explicit capabilities passed in by the
//! caller, never ambient state.

pub mod accounts;
pub mod credential;
pub mod error;
pub mod instruction;
pub mod issuance;
pub mod network;
pub mod pda;
pub mod storage;
pub mod submit;
pub mod types;
pub mod wallet;

// Re-export key types
pub use credential::{Credential, CredentialDraft, MIN_EXPIRY_BUFFER_SECS};
pub use error::{
    ConfigError, EncodingError, IssuanceError, SubmissionError, UploadError, ValidationError,
};
pub use issuance::IssuancePipeline;
pub use network::{NetworkClient, RpcNetworkClient, DEVNET_RPC_URL};
pub use pda::PdaDeriver;
pub use storage::{ContentStore, RetryPolicy, StorageProvider, StorageUploader};
pub use submit::{SubmissionReceipt, SubmissionState, SubmitterConfig, TransactionSubmitter};
pub use types::{ContentReference, CredentialAccount, IdentityAccount, IssuanceOutcome};
pub use wallet::{KeypairWallet, WalletCapability};
