// PDA derivation utilities for the identity and credential accounts
use solana_sdk::pubkey::Pubkey;

use crate::types::ContentReference;

/// Domain-separation seed for identity accounts
pub const IDENTITY_SEED: &[u8] = b"identity";
/// Domain-separation seed for credential accounts
pub const CREDENTIAL_SEED: &[u8] = b"credential";

/// PDA derivation utilities
pub struct PdaDeriver;

impl PdaDeriver {
    /// Derive the identity account PDA for a wallet
    pub fn derive_identity(wallet: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[IDENTITY_SEED, wallet.as_ref()], program_id)
    }

    /// Derive the credential account PDA for a content reference
    pub fn derive_credential(content_ref: &ContentReference, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[CREDENTIAL_SEED, content_ref.as_bytes()],
            program_id,
        )
    }
}
