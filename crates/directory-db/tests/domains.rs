//! Integration tests for domain repository operations.

mod common;

use common::{create_domain, create_user, setup_pool};
use directory_core::DomainId;
use directory_db::models::{CreateDomain, Domain, UpdateDomain, User};
use directory_db::{DbError, Session};

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let created = Domain::create(
        session.conn(),
        CreateDomain {
            name: "acme".to_string(),
            description: Some("Acme Corp".to_string()),
            is_default: false,
        },
    )
    .await
    .unwrap();

    let by_id = Domain::get(session.conn(), &created.id())
        .await
        .unwrap()
        .expect("domain should exist");
    assert_eq!(by_id.name, "acme");
    assert_eq!(by_id.description.as_deref(), Some("Acme Corp"));
    assert!(!by_id.is_default);

    let by_name = Domain::get_by_name(session.conn(), "acme")
        .await
        .unwrap()
        .expect("domain should be found by name");
    assert_eq!(by_name.id, created.id);
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let missing = Domain::get(session.conn(), &DomainId::new()).await.unwrap();
    assert!(missing.is_none());

    let missing = Domain::get_by_name(session.conn(), "nowhere").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_empty_name_rejected_and_nothing_persisted() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    for name in ["", "   "] {
        let err = Domain::create(
            session.conn(),
            CreateDomain {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation_failed(), "got {err:?}");
    }

    let all = Domain::list_all(session.conn()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_duplicate_name_conflict() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    create_domain(&mut session, "acme").await;

    let err = Domain::create(
        session.conn(),
        CreateDomain {
            name: "acme".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    assert_eq!(Domain::list_all(session.conn()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_partial_update_bumps_updated_at() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;

    let updated = Domain::update(
        session.conn(),
        &domain.id(),
        UpdateDomain {
            description: Some("Updated description".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Untouched fields survive, timestamp moves forward
    assert_eq!(updated.name, "acme");
    assert_eq!(updated.description.as_deref(), Some("Updated description"));
    assert!(updated.updated_at >= domain.updated_at);
}

#[tokio::test]
async fn test_update_missing_not_found() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let err = Domain::update(
        session.conn(),
        &DomainId::new(),
        UpdateDomain {
            name: Some("ghost".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_delete_restricted_while_users_remain() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let user = create_user(&mut session, &domain.id(), "alice@acme.example").await;

    let err = Domain::delete(session.conn(), &domain.id()).await.unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");
    assert!(Domain::get(session.conn(), &domain.id())
        .await
        .unwrap()
        .is_some());

    // Remove the dependent user, then deletion succeeds
    User::delete(session.conn(), &user.id()).await.unwrap();
    Domain::delete(session.conn(), &domain.id()).await.unwrap();
    assert!(Domain::get(session.conn(), &domain.id())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_missing_not_found() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let err = Domain::delete(session.conn(), &DomainId::new()).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_list_all_ordered_by_name() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    create_domain(&mut session, "zeta").await;
    create_domain(&mut session, "acme").await;
    create_domain(&mut session, "midgard").await;

    let names: Vec<String> = Domain::list_all(session.conn())
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["acme", "midgard", "zeta"]);
}
