//! Wallet capability seam.
//!
//! The workflow never reads a wallet from ambient state; callers hand it a
//! `WalletCapability` explicitly. A wallet that cannot sign is reported as
//! `SigningUnsupported`, never a crash.

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey, signature::Keypair, signer::Signer, transaction::Transaction,
};

use crate::error::{ConfigError, SubmissionError};

/// Signing capability supplied by the embedding application
#[async_trait]
pub trait WalletCapability: Send + Sync {
    fn public_address(&self) -> Pubkey;

    /// Whether the wallet can produce transaction signatures
    fn supports_signing(&self) -> bool;

    /// Sign the transaction, returning it with the fee payer signature
    /// attached. The blockhash must already be set.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, SubmissionError>;
}

/// File-backed keypair wallet for headless services
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load a keypair from a JSON byte-array file (`~` is expanded)
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let path = shellexpand::tilde(path).to_string();
        let raw = std::fs::read(&path).map_err(|source| ConfigError::KeypairFile {
            path: path.clone(),
            source,
        })?;
        let bytes: Vec<u8> = serde_json::from_slice(&raw)
            .map_err(|_| ConfigError::KeypairParse { path: path.clone() })?;
        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|_| ConfigError::KeypairParse { path })?;
        Ok(Self { keypair })
    }
}

#[async_trait]
impl WalletCapability for KeypairWallet {
    fn public_address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn supports_signing(&self) -> bool {
        true
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, SubmissionError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|err| SubmissionError::Signing(err.to_string()))?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_round_trips_keypair() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let wallet = KeypairWallet::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.public_address(), keypair.pubkey());
        assert!(wallet.supports_signing());
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        assert!(matches!(
            KeypairWallet::from_file("/nonexistent/id.json"),
            Err(ConfigError::KeypairFile { .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a keypair").unwrap();
        assert!(matches!(
            KeypairWallet::from_file(file.path().to_str().unwrap()),
            Err(ConfigError::KeypairParse { .. })
        ));
    }
}
