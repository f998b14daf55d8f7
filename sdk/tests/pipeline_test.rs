//! End-to-end pipeline tests with mock collaborators

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{MockNetwork, MockStore, MockWallet};
use idenclave_sdk::{
    ContentReference, Credential, CredentialDraft, IssuancePipeline, IssuanceError,
    PdaDeriver, SubmitterConfig, UploadError,
};
use solana_sdk::{account::Account, pubkey::Pubkey};
use tokio_util::sync::CancellationToken;

fn age_draft() -> CredentialDraft {
    CredentialDraft {
        credential_type: "AgeVerification".to_string(),
        claims: BTreeMap::from([("min_age".to_string(), "18".to_string())]),
        expires_at: Some(Utc::now().timestamp() + 365 * 86_400),
    }
}

fn registered_identity(program_id: &Pubkey) -> Option<Account> {
    Some(Account::new(1_000_000, 0, program_id))
}

fn pipeline(
    program_id: Pubkey,
    network: Arc<MockNetwork>,
    wallet: Arc<MockWallet>,
    store: Arc<MockStore>,
) -> IssuancePipeline {
    IssuancePipeline::new(program_id, network, wallet, store).with_submitter_config(
        SubmitterConfig {
            max_send_attempts: 3,
            poll_interval: Duration::from_millis(1),
        },
    )
}

#[tokio::test]
async fn test_issue_uploads_then_submits() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork {
        account: registered_identity(&program_id),
        ..MockNetwork::default()
    });
    let wallet = Arc::new(MockWallet::default());
    let store = Arc::new(MockStore::default());

    let outcome = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::clone(&wallet),
        Arc::clone(&store),
    )
    .issue(&age_draft(), &CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(outcome.cid, store.cid);
    assert_eq!(
        outcome.content_ref,
        ContentReference::from_identifier(&store.cid)
    );
    assert_eq!(
        outcome.credential_address,
        PdaDeriver::derive_credential(&outcome.content_ref, &program_id).0
    );
    assert_eq!(outcome.signature, network.signature);

    // The pinned payload is the canonical credential with the issuer set
    let uploads = store.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let pinned: Credential = serde_json::from_slice(&uploads[0]).unwrap();
    assert_eq!(pinned.issuer, Some(wallet.address));
    assert_eq!(pinned.credential_type, "AgeVerification");
}

#[tokio::test]
async fn test_issue_derives_the_same_address_on_repeat() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork {
        account: registered_identity(&program_id),
        ..MockNetwork::default()
    });
    let pipeline = pipeline(
        program_id,
        network,
        Arc::new(MockWallet::default()),
        Arc::new(MockStore::default()),
    );

    let first = pipeline
        .issue(&age_draft(), &CancellationToken::new())
        .await
        .unwrap();
    let second = pipeline
        .issue(&age_draft(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.credential_address, second.credential_address);
}

#[tokio::test]
async fn test_validation_failure_touches_nothing() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default());
    let store = Arc::new(MockStore::default());
    let mut draft = age_draft();
    draft.credential_type = String::new();

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        Arc::clone(&store),
    )
    .issue(&draft, &CancellationToken::new())
    .await
    .unwrap_err();

    assert!(matches!(err, IssuanceError::Validation(_)));
    assert!(store.uploads.lock().unwrap().is_empty());
    assert_eq!(network.calls().account, 0);
    assert_eq!(network.calls().send, 0);
}

#[tokio::test]
async fn test_upload_failure_aborts_before_any_chain_interaction() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default());
    let store = Arc::new(MockStore {
        fail_status: Some(500),
        ..MockStore::default()
    });

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        store,
    )
    .issue(&age_draft(), &CancellationToken::new())
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        IssuanceError::Upload(UploadError::Service { status: 500 })
    ));
    let calls = network.calls();
    assert_eq!(calls.account, 0);
    assert_eq!(calls.blockhash, 0);
    assert_eq!(calls.send, 0);
}

#[tokio::test]
async fn test_issue_requires_a_registered_identity() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default()); // no identity account
    let wallet = Arc::new(MockWallet::default());

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::clone(&wallet),
        Arc::new(MockStore::default()),
    )
    .issue(&age_draft(), &CancellationToken::new())
    .await
    .unwrap_err();

    match err {
        IssuanceError::IdentityNotRegistered { wallet: reported } => {
            assert_eq!(reported, wallet.address);
        }
        other => panic!("expected IdentityNotRegistered, got {other:?}"),
    }
    assert_eq!(network.calls().send, 0);
}

#[tokio::test]
async fn test_register_identity_rejects_double_registration() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork {
        account: registered_identity(&program_id),
        ..MockNetwork::default()
    });

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        Arc::new(MockStore::default()),
    )
    .register_identity(&CancellationToken::new())
    .await
    .unwrap_err();

    assert!(matches!(err, IssuanceError::AlreadyRegistered { .. }));
    assert_eq!(network.calls().send, 0);
}

#[tokio::test]
async fn test_register_identity_submits_when_unregistered() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default());

    let receipt = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        Arc::new(MockStore::default()),
    )
    .register_identity(&CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(receipt.signature, network.signature);
    assert_eq!(network.calls().send, 1);
}

#[tokio::test]
async fn test_revoke_requires_an_existing_credential() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default());
    let reference = ContentReference::from_identifier("QmMissing");

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        Arc::new(MockStore::default()),
    )
    .revoke_credential(&reference, &CancellationToken::new())
    .await
    .unwrap_err();

    assert!(matches!(err, IssuanceError::CredentialNotFound { .. }));
    assert_eq!(network.calls().send, 0);
}

#[tokio::test]
async fn test_cancelled_issue_never_uploads() {
    let program_id = Pubkey::new_unique();
    let network = Arc::new(MockNetwork::default());
    let store = Arc::new(MockStore::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline(
        program_id,
        Arc::clone(&network),
        Arc::new(MockWallet::default()),
        Arc::clone(&store),
    )
    .issue(&age_draft(), &cancel)
    .await
    .unwrap_err();

    assert!(matches!(err, IssuanceError::Cancelled));
    assert!(store.uploads.lock().unwrap().is_empty());
    assert_eq!(network.calls().send, 0);
}
