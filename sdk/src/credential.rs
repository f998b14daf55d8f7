//! Credential construction and validation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::ValidationError;

/// Minimum distance between "now" and the expiry a draft may carry
pub const MIN_EXPIRY_BUFFER_SECS: i64 = 60;

/// An immutable credential record, ready for upload.
///
/// Claims are kept in a `BTreeMap` so the canonical byte encoding has a
/// stable key order without a separate canonicalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub claims: BTreeMap<String, String>,
    /// Issuing wallet address; `None` until a connected wallet is known
    pub issuer: Option<Pubkey>,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Credential {
    /// Canonical byte encoding used for the content-addressed upload.
    /// Field order is fixed by the struct, claim order by the map.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// User-supplied input for one issuance attempt
#[derive(Debug, Clone, Default)]
pub struct CredentialDraft {
    pub credential_type: String,
    pub claims: BTreeMap<String, String>,
    pub expires_at: Option<i64>,
}

impl CredentialDraft {
    /// Validate the draft against `now` (seconds since epoch) and produce
    /// the credential record. Pure; the caller fills in `issuer` once a
    /// wallet address is known.
    pub fn build(&self, now: i64) -> Result<Credential, ValidationError> {
        let credential_type = self.credential_type.trim();
        if credential_type.is_empty() {
            return Err(ValidationError::EmptyType);
        }
        if self.claims.is_empty() {
            return Err(ValidationError::NoClaims);
        }
        if self.claims.keys().any(|key| key.trim().is_empty()) {
            return Err(ValidationError::EmptyClaimKey);
        }
        let expires_at = self.expires_at.ok_or(ValidationError::MissingExpiry)?;
        if expires_at < now + MIN_EXPIRY_BUFFER_SECS {
            return Err(ValidationError::ExpiresTooSoon {
                min_buffer_secs: MIN_EXPIRY_BUFFER_SECS,
            });
        }
        Ok(Credential {
            credential_type: credential_type.to_string(),
            claims: self.claims.clone(),
            issuer: None,
            issued_at: now,
            expires_at,
        })
    }
}
