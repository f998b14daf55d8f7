//! Error taxonomy for the issuance workflow

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

/// Rejected user input. Recoverable by editing the draft; no network
/// call is made before these are checked.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("credential type is required")]
    EmptyType,
    #[error("at least one claim is required")]
    NoClaims,
    #[error("claim keys must be non-empty")]
    EmptyClaimKey,
    #[error("expiration timestamp is required")]
    MissingExpiry,
    #[error("expiration must be at least {min_buffer_secs}s in the future")]
    ExpiresTooSoon { min_buffer_secs: i64 },
}

/// Missing or malformed externally supplied configuration. Fatal until
/// corrected outside the workflow.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("storage endpoint is not configured")]
    MissingStorageEndpoint,
    #[error("storage credentials are not configured")]
    MissingStorageCredentials,
    #[error("failed to read keypair file {path}: {source}")]
    KeypairFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("keypair file {path} does not contain a valid keypair")]
    KeypairParse { path: String },
}

/// Content-address upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("storage transport error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("storage service returned status {status}")]
    Service { status: u16 },
    #[error("storage response is missing the content identifier")]
    MissingIdentifier,
}

/// Malformed instruction payloads or content references. These indicate a
/// programming error or corrupted input, never ordinary user error.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("instruction payload must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("unknown instruction opcode {0}")]
    Opcode(u8),
    #[error("content reference must be 32 base58-encoded bytes")]
    ContentReference,
}

/// Failure modes of a single transaction submission. Variants reached
/// after the send carry the signature so the caller can check status
/// out of band.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("the connected wallet cannot sign transactions")]
    SigningUnsupported,
    #[error("the signer rejected the transaction")]
    UserRejected,
    #[error("transaction signing failed: {0}")]
    Signing(String),
    #[error("rpc transport error: {message}")]
    Network {
        message: String,
        signature: Option<Signature>,
    },
    #[error("transaction {signature} failed on chain: {reason}")]
    ExecutionFailed { signature: Signature, reason: String },
    #[error("transaction was not confirmed within the blockhash validity window")]
    TimedOut { signature: Signature },
    #[error("submission was cancelled")]
    Cancelled { signature: Option<Signature> },
}

/// Umbrella error for the issuance pipeline. Every failure is isolable:
/// nothing here is fatal to the embedding application.
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("no identity account is registered for {wallet}")]
    IdentityNotRegistered { wallet: Pubkey },
    #[error("an identity account already exists for {wallet}")]
    AlreadyRegistered { wallet: Pubkey },
    #[error("credential account {address} does not exist")]
    CredentialNotFound { address: Pubkey },
    #[error("issuance was cancelled")]
    Cancelled,
}
