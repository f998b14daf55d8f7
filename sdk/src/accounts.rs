//! On-chain account state decoding.
//!
//! Layouts are fixed little-endian:
//!
//! Identity: `is_initialized u8 | authority 32 | recovery tag u8 (+32 when
//! set) | attribute length u32 | attribute bytes`.
//!
//! Credential (114 bytes): `expires_at i64 | is_initialized u8 | revoked u8
//! | identity 32 | issuer 32 | content_ref 32 | issued_at i64`.
//!
//! Parsers return `None` for uninitialized, truncated, or foreign account
//! data rather than erroring; anything the program owns that does not decode
//! is simply not ours.

use solana_sdk::pubkey::Pubkey;

use crate::types::{ContentReference, CredentialAccount, IdentityAccount};

/// Serialized size of a credential account
pub const CREDENTIAL_ACCOUNT_LEN: usize = 8 + 1 + 1 + 32 + 32 + 32 + 8;

pub fn parse_identity(data: &[u8]) -> Option<IdentityAccount> {
    if data.is_empty() || data[0] != 1 {
        return None;
    }
    let mut offset = 1;

    if data.len() < offset + 32 {
        return None;
    }
    let authority = Pubkey::new_from_array(data[offset..offset + 32].try_into().ok()?);
    offset += 32;

    if data.len() < offset + 1 {
        return None;
    }
    let recovery = match data[offset] {
        0 => {
            offset += 1;
            None
        }
        1 => {
            offset += 1;
            if data.len() < offset + 32 {
                return None;
            }
            let key = Pubkey::new_from_array(data[offset..offset + 32].try_into().ok()?);
            offset += 32;
            Some(key)
        }
        _ => return None,
    };

    if data.len() < offset + 4 {
        return None;
    }
    let attr_len = u32::from_le_bytes(data[offset..offset + 4].try_into().ok()?) as usize;
    offset += 4;
    if data.len() < offset + attr_len {
        return None;
    }
    let attributes = data[offset..offset + attr_len].to_vec();

    Some(IdentityAccount {
        authority,
        recovery,
        attributes,
    })
}

pub fn parse_credential(data: &[u8]) -> Option<CredentialAccount> {
    if data.len() < CREDENTIAL_ACCOUNT_LEN {
        return None;
    }
    let expires_at = i64::from_le_bytes(data[0..8].try_into().ok()?);
    let is_initialized = data[8];
    let revoked = data[9];
    if is_initialized != 1 || revoked > 1 {
        return None;
    }
    let identity = Pubkey::new_from_array(data[10..42].try_into().ok()?);
    let issuer = Pubkey::new_from_array(data[42..74].try_into().ok()?);
    let content_ref = ContentReference::from_bytes(data[74..106].try_into().ok()?);
    let issued_at = i64::from_le_bytes(data[106..114].try_into().ok()?);

    Some(CredentialAccount {
        identity,
        issuer,
        content_ref,
        issued_at,
        expires_at,
        revoked: revoked == 1,
    })
}

/// Serialize identity state; the inverse of [`parse_identity`]
pub fn pack_identity(identity: &IdentityAccount) -> Vec<u8> {
    let mut data = vec![1u8];
    data.extend_from_slice(identity.authority.as_ref());
    match identity.recovery {
        Some(recovery) => {
            data.push(1);
            data.extend_from_slice(recovery.as_ref());
        }
        None => data.push(0),
    }
    data.extend_from_slice(&(identity.attributes.len() as u32).to_le_bytes());
    data.extend_from_slice(&identity.attributes);
    data
}

/// Serialize credential state; the inverse of [`parse_credential`]
pub fn pack_credential(credential: &CredentialAccount) -> Vec<u8> {
    let mut data = Vec::with_capacity(CREDENTIAL_ACCOUNT_LEN);
    data.extend_from_slice(&credential.expires_at.to_le_bytes());
    data.push(1);
    data.push(u8::from(credential.revoked));
    data.extend_from_slice(credential.identity.as_ref());
    data.extend_from_slice(credential.issuer.as_ref());
    data.extend_from_slice(credential.content_ref.as_bytes());
    data.extend_from_slice(&credential.issued_at.to_le_bytes());
    data
}
