//! Integration tests for credential validation, including the transparent
//! upgrade of legacy plain-text credentials.

mod common;

use common::{create_domain, fast_hasher, setup_pool};
use directory_db::models::{CreateUser, UpdateUser, User};
use directory_db::{validate_credentials, Session};

#[tokio::test]
async fn test_valid_digest_credentials() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();
    let hasher = fast_hasher();

    let domain = create_domain(&mut session, "acme").await;
    let digest = hasher.hash("correct horse").unwrap();
    let created = User::create(
        session.conn(),
        CreateUser {
            username: "alice@acme.example".to_string(),
            password: digest.clone(),
            domain_id: domain.id(),
            first_name: None,
            last_name: None,
            display_name: None,
        },
    )
    .await
    .unwrap();

    let user = validate_credentials(session.conn(), "alice@acme.example", "correct horse", &hasher)
        .await
        .unwrap()
        .expect("credentials should validate");
    assert_eq!(user.id, created.id);

    // A digest match does not rewrite the stored credential
    let stored = User::get(session.conn(), &created.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password, digest);
}

#[tokio::test]
async fn test_failures_are_uniform() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();
    let hasher = fast_hasher();

    let domain = create_domain(&mut session, "acme").await;
    let digest = hasher.hash("correct horse").unwrap();
    let user = User::create(
        session.conn(),
        CreateUser {
            username: "alice@acme.example".to_string(),
            password: digest,
            domain_id: domain.id(),
            first_name: None,
            last_name: None,
            display_name: None,
        },
    )
    .await
    .unwrap();

    // Unknown username
    let result = validate_credentials(session.conn(), "nobody@acme.example", "whatever", &hasher)
        .await
        .unwrap();
    assert!(result.is_none());

    // Wrong password
    let result = validate_credentials(session.conn(), "alice@acme.example", "wrong", &hasher)
        .await
        .unwrap();
    assert!(result.is_none());

    // Inactive account, even with the right password
    User::update(
        session.conn(),
        &user.id(),
        UpdateUser {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let result =
        validate_credentials(session.conn(), "alice@acme.example", "correct horse", &hasher)
            .await
            .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_legacy_plaintext_upgraded_on_successful_login() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();
    let hasher = fast_hasher();

    let domain = create_domain(&mut session, "acme").await;
    // Simulates a record imported from an older deployment
    let created = User::create(
        session.conn(),
        CreateUser {
            username: "legacy@acme.example".to_string(),
            password: "hunter2".to_string(),
            domain_id: domain.id(),
            first_name: None,
            last_name: None,
            display_name: None,
        },
    )
    .await
    .unwrap();

    let user = validate_credentials(session.conn(), "legacy@acme.example", "hunter2", &hasher)
        .await
        .unwrap()
        .expect("legacy credentials should validate");
    assert_eq!(user.id, created.id);

    // The stored value is now an Argon2id digest, and still validates
    let stored = User::get(session.conn(), &created.id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password.starts_with("$argon2id$"));

    let again = validate_credentials(session.conn(), "legacy@acme.example", "hunter2", &hasher)
        .await
        .unwrap();
    assert!(again.is_some());

    // The wrong password still fails after the upgrade
    let result = validate_credentials(session.conn(), "legacy@acme.example", "hunter3", &hasher)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_legacy_mismatch_leaves_stored_value_untouched() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();
    let hasher = fast_hasher();

    let domain = create_domain(&mut session, "acme").await;
    let created = User::create(
        session.conn(),
        CreateUser {
            username: "legacy@acme.example".to_string(),
            password: "hunter2".to_string(),
            domain_id: domain.id(),
            first_name: None,
            last_name: None,
            display_name: None,
        },
    )
    .await
    .unwrap();

    let result = validate_credentials(session.conn(), "legacy@acme.example", "wrong", &hasher)
        .await
        .unwrap();
    assert!(result.is_none());

    let stored = User::get(session.conn(), &created.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password, "hunter2");
}
