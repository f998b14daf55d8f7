//! Instruction encoding for the identity and credential program.
//!
//! One canonical wire format: a single-byte opcode discriminant followed by
//! the fixed little-endian payload for that opcode, and one canonical
//! account ordering per instruction. The builders here are the only place
//! either is spelled out.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::error::EncodingError;
use crate::types::ContentReference;

/// Single-byte instruction discriminants understood by the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    RegisterIdentity = 0,
    UpdateAuthority = 1,
    CloseIdentity = 2,
    SetAttributes = 3,
    SetRecovery = 4,
    RecoverAuthority = 5,
    IssueCredential = 6,
    RevokeCredential = 7,
    CloseCredential = 8,
}

impl TryFrom<u8> for Opcode {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::RegisterIdentity),
            1 => Ok(Self::UpdateAuthority),
            2 => Ok(Self::CloseIdentity),
            3 => Ok(Self::SetAttributes),
            4 => Ok(Self::SetRecovery),
            5 => Ok(Self::RecoverAuthority),
            6 => Ok(Self::IssueCredential),
            7 => Ok(Self::RevokeCredential),
            8 => Ok(Self::CloseCredential),
            other => Err(EncodingError::Opcode(other)),
        }
    }
}

/// Fixed length of an encoded `IssueCredential` payload:
/// opcode + content reference + two little-endian i64 timestamps
pub const ISSUE_PAYLOAD_LEN: usize = 1 + 32 + 8 + 8;

/// Payload of the `IssueCredential` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuePayload {
    pub content_ref: ContentReference,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl IssuePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(ISSUE_PAYLOAD_LEN);
        data.push(Opcode::IssueCredential as u8);
        data.extend_from_slice(self.content_ref.as_bytes());
        data.extend_from_slice(&self.issued_at.to_le_bytes());
        data.extend_from_slice(&self.expires_at.to_le_bytes());
        data
    }

    pub fn decode(data: &[u8]) -> Result<Self, EncodingError> {
        if data.len() != ISSUE_PAYLOAD_LEN {
            return Err(EncodingError::Length {
                expected: ISSUE_PAYLOAD_LEN,
                actual: data.len(),
            });
        }
        if Opcode::try_from(data[0])? != Opcode::IssueCredential {
            return Err(EncodingError::Opcode(data[0]));
        }
        let content_ref = ContentReference::from_bytes(
            data[1..33]
                .try_into()
                .map_err(|_| EncodingError::Length {
                    expected: ISSUE_PAYLOAD_LEN,
                    actual: data.len(),
                })?,
        );
        let issued_at = i64::from_le_bytes(
            data[33..41]
                .try_into()
                .map_err(|_| EncodingError::Length {
                    expected: ISSUE_PAYLOAD_LEN,
                    actual: data.len(),
                })?,
        );
        let expires_at = i64::from_le_bytes(
            data[41..49]
                .try_into()
                .map_err(|_| EncodingError::Length {
                    expected: ISSUE_PAYLOAD_LEN,
                    actual: data.len(),
                })?,
        );
        Ok(Self {
            content_ref,
            issued_at,
            expires_at,
        })
    }
}

/// Create the identity account for `authority`
pub fn register_identity(
    program_id: &Pubkey,
    identity: &Pubkey,
    authority: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: vec![Opcode::RegisterIdentity as u8],
    }
}

/// Create the credential account referenced by `payload.content_ref`.
/// The identity account must already exist.
pub fn issue_credential(
    program_id: &Pubkey,
    identity: &Pubkey,
    credential: &Pubkey,
    issuer: &Pubkey,
    payload: &IssuePayload,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*credential, false),
            AccountMeta::new(*issuer, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: payload.encode(),
    }
}

/// Mark a credential revoked. Only its issuer may sign this.
pub fn revoke_credential(
    program_id: &Pubkey,
    credential: &Pubkey,
    issuer: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*credential, false),
            AccountMeta::new_readonly(*issuer, true),
        ],
        data: vec![Opcode::RevokeCredential as u8],
    }
}

/// Close the identity account, refunding rent to the authority
pub fn close_identity(
    program_id: &Pubkey,
    identity: &Pubkey,
    authority: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*authority, true),
        ],
        data: vec![Opcode::CloseIdentity as u8],
    }
}

/// Close a credential account, refunding rent to the issuer
pub fn close_credential(
    program_id: &Pubkey,
    credential: &Pubkey,
    issuer: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*credential, false),
            AccountMeta::new(*issuer, true),
        ],
        data: vec![Opcode::CloseCredential as u8],
    }
}

/// Replace the identity's authority key
pub fn update_authority(
    program_id: &Pubkey,
    identity: &Pubkey,
    authority: &Pubkey,
    new_authority: &Pubkey,
) -> Instruction {
    let mut data = vec![Opcode::UpdateAuthority as u8];
    data.extend_from_slice(new_authority.as_ref());
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*authority, true),
        ],
        data,
    }
}

/// Attach opaque attribute bytes to the identity
pub fn set_attributes(
    program_id: &Pubkey,
    identity: &Pubkey,
    authority: &Pubkey,
    attributes: &[u8],
) -> Instruction {
    let mut data = vec![Opcode::SetAttributes as u8];
    data.extend_from_slice(attributes);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*authority, true),
        ],
        data,
    }
}

/// Nominate a recovery key for the identity
pub fn set_recovery(
    program_id: &Pubkey,
    identity: &Pubkey,
    authority: &Pubkey,
    recovery: &Pubkey,
) -> Instruction {
    let mut data = vec![Opcode::SetRecovery as u8];
    data.extend_from_slice(recovery.as_ref());
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*authority, true),
        ],
        data,
    }
}

/// Rotate the authority using the nominated recovery key
pub fn recover_authority(
    program_id: &Pubkey,
    identity: &Pubkey,
    recovery: &Pubkey,
    new_authority: &Pubkey,
) -> Instruction {
    let mut data = vec![Opcode::RecoverAuthority as u8];
    data.extend_from_slice(new_authority.as_ref());
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*identity, false),
            AccountMeta::new(*recovery, true),
        ],
        data,
    }
}
