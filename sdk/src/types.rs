//! Common types used across the issuance workflow

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::error::EncodingError;
use crate::submit::SubmissionReceipt;

/// Fixed-length on-chain reference to an uploaded credential.
///
/// Derived by hashing the full content identifier string, so distinct
/// identifiers map to distinct references regardless of identifier length.
/// Used verbatim as a PDA seed and instruction payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentReference([u8; 32]);

impl ContentReference {
    /// Reference for a content identifier returned by the storage service
    pub fn from_identifier(identifier: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        Self(hasher.finalize().into())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl FromStr for ContentReference {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| EncodingError::ContentReference)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EncodingError::ContentReference)?;
        Ok(Self(bytes))
    }
}

/// Decoded identity account state. The account's existence is the
/// registration signal; only initialized accounts decode successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAccount {
    pub authority: Pubkey,
    pub recovery: Option<Pubkey>,
    pub attributes: Vec<u8>,
}

/// Decoded credential account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAccount {
    pub identity: Pubkey,
    pub issuer: Pubkey,
    pub content_ref: ContentReference,
    pub issued_at: i64,
    pub expires_at: i64,
    pub revoked: bool,
}

/// Result of a successful end-to-end issuance
#[derive(Debug, Clone)]
pub struct IssuanceOutcome {
    /// Content identifier assigned by the storage service
    pub cid: String,
    pub content_ref: ContentReference,
    pub credential_address: Pubkey,
    pub signature: Signature,
    pub receipt: SubmissionReceipt,
}
