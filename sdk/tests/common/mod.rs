//! Mock collaborators shared by the integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use idenclave_sdk::{NetworkClient, SubmissionError, UploadError, WalletCapability};
use idenclave_sdk::storage::ContentStore;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

/// Per-method call counters
#[derive(Debug, Default, Clone, Copy)]
pub struct Calls {
    pub blockhash: u32,
    pub send: u32,
    pub status: u32,
    pub height: u32,
    pub account: u32,
}

pub struct MockNetwork {
    pub calls: Mutex<Calls>,
    pub signature: Signature,
    /// Fail this many sends before accepting one
    pub send_failures: u32,
    /// Successive status poll answers; the last entry repeats forever
    pub statuses: Mutex<VecDeque<Option<Result<(), String>>>>,
    /// Successive block heights; the last entry repeats forever
    pub heights: Mutex<VecDeque<u64>>,
    pub last_valid_block_height: u64,
    pub account: Option<Account>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            signature: Signature::from([7u8; 64]),
            send_failures: 0,
            statuses: Mutex::new(VecDeque::from([Some(Ok(()))])),
            heights: Mutex::new(VecDeque::from([1u64])),
            last_valid_block_height: 100,
            account: None,
        }
    }
}

impl MockNetwork {
    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> T {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl NetworkClient for MockNetwork {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), SubmissionError> {
        self.calls.lock().unwrap().blockhash += 1;
        Ok((Hash::default(), self.last_valid_block_height))
    }

    async fn send_transaction(&self, _tx: &Transaction) -> Result<Signature, SubmissionError> {
        let mut calls = self.calls.lock().unwrap();
        calls.send += 1;
        if calls.send <= self.send_failures {
            return Err(SubmissionError::Network {
                message: "connection reset".to_string(),
                signature: None,
            });
        }
        Ok(self.signature)
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<Result<(), String>>, SubmissionError> {
        self.calls.lock().unwrap().status += 1;
        Ok(Self::next(&self.statuses))
    }

    async fn block_height(&self) -> Result<u64, SubmissionError> {
        self.calls.lock().unwrap().height += 1;
        Ok(Self::next(&self.heights))
    }

    async fn get_account(&self, _address: &Pubkey) -> Result<Option<Account>, SubmissionError> {
        self.calls.lock().unwrap().account += 1;
        Ok(self.account.clone())
    }
}

pub struct MockWallet {
    pub address: Pubkey,
    pub can_sign: bool,
    pub rejects: bool,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            address: Pubkey::new_unique(),
            can_sign: true,
            rejects: false,
        }
    }
}

#[async_trait]
impl WalletCapability for MockWallet {
    fn public_address(&self) -> Pubkey {
        self.address
    }

    fn supports_signing(&self) -> bool {
        self.can_sign
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, SubmissionError> {
        if self.rejects {
            return Err(SubmissionError::UserRejected);
        }
        Ok(tx)
    }
}

pub struct MockStore {
    pub cid: String,
    pub fail_status: Option<u16>,
    pub uploads: Mutex<Vec<Vec<u8>>>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            cid: "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".to_string(),
            fail_status: None,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        self.uploads.lock().unwrap().push(bytes);
        if let Some(status) = self.fail_status {
            return Err(UploadError::Service { status });
        }
        Ok(self.cid.clone())
    }
}
