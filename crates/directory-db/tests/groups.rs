//! Integration tests for groups, roles, and their membership tables.

mod common;

use common::{create_domain, create_user, setup_pool};
use directory_core::UserId;
use directory_db::models::{CreateGroup, Group, Role, UpdateGroup, User, UserGroup, UserRole};
use directory_db::Session;

#[tokio::test]
async fn test_group_create_then_get() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "engineering".to_string(),
            description: Some("Engineering team".to_string()),
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();

    let by_id = Group::get(session.conn(), &group.id())
        .await
        .unwrap()
        .expect("group should exist");
    assert_eq!(by_id.name, "engineering");

    let by_name = Group::get_by_name(session.conn(), &domain.id(), "engineering")
        .await
        .unwrap()
        .expect("group should be found by name");
    assert_eq!(by_name.id, group.id);
}

#[tokio::test]
async fn test_group_name_unique_per_domain_only() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let acme = create_domain(&mut session, "acme").await;
    let other = create_domain(&mut session, "other").await;

    Group::create(
        session.conn(),
        CreateGroup {
            name: "engineering".to_string(),
            description: None,
            domain_id: acme.id(),
        },
    )
    .await
    .unwrap();

    // Same name in the same domain collides
    let err = Group::create(
        session.conn(),
        CreateGroup {
            name: "engineering".to_string(),
            description: None,
            domain_id: acme.id(),
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    // Same name in another domain is fine
    Group::create(
        session.conn(),
        CreateGroup {
            name: "engineering".to_string(),
            description: None,
            domain_id: other.id(),
        },
    )
    .await
    .unwrap();

    assert_eq!(Group::list_all(session.conn()).await.unwrap().len(), 2);
    assert_eq!(
        Group::list_by_domain(session.conn(), &acme.id())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_group_update() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "eng".to_string(),
            description: None,
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();

    let updated = Group::update(
        session.conn(),
        &group.id(),
        UpdateGroup {
            name: Some("engineering".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "engineering");
    assert!(updated.updated_at >= group.updated_at);
}

#[tokio::test]
async fn test_membership_add_remove() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let alice = create_user(&mut session, &domain.id(), "alice@acme.example").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "staff".to_string(),
            description: None,
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();

    UserGroup::add_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap();
    assert!(UserGroup::is_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap());

    // Double add collides
    let err = UserGroup::add_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    let members = UserGroup::members_of(session.conn(), &group.id()).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username, "alice@acme.example");

    assert!(UserGroup::remove_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap());
    assert!(!UserGroup::remove_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap());
    assert_eq!(
        UserGroup::count_members(session.conn(), &group.id())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_replace_members_is_atomic() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let alice = create_user(&mut session, &domain.id(), "alice@acme.example").await;
    let bob = create_user(&mut session, &domain.id(), "bob@acme.example").await;
    let carol = create_user(&mut session, &domain.id(), "carol@acme.example").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "staff".to_string(),
            description: None,
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();

    UserGroup::add_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap();
    UserGroup::add_member(session.conn(), &bob.id(), &group.id())
        .await
        .unwrap();

    UserGroup::replace_members(session.conn(), &group.id(), &[bob.id(), carol.id()])
        .await
        .unwrap();

    let usernames: Vec<String> = UserGroup::members_of(session.conn(), &group.id())
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(usernames, vec!["bob@acme.example", "carol@acme.example"]);

    // A list containing an unknown user fails and leaves membership intact
    let err = UserGroup::replace_members(
        session.conn(),
        &group.id(),
        &[alice.id(), UserId::new()],
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    let usernames: Vec<String> = UserGroup::members_of(session.conn(), &group.id())
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(usernames, vec!["bob@acme.example", "carol@acme.example"]);
}

#[tokio::test]
async fn test_group_delete_cascades_memberships() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let alice = create_user(&mut session, &domain.id(), "alice@acme.example").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "staff".to_string(),
            description: None,
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();
    UserGroup::add_member(session.conn(), &alice.id(), &group.id())
        .await
        .unwrap();

    Group::delete(session.conn(), &group.id()).await.unwrap();

    assert!(UserGroup::groups_for_user(session.conn(), &alice.id())
        .await
        .unwrap()
        .is_empty());
    // The member survives
    assert!(User::get(session.conn(), &alice.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_role_crud_and_assignment() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let alice = create_user(&mut session, &domain.id(), "alice@acme.example").await;

    let role = Role::create(session.conn(), "admin", Some("Administrator with full access"))
        .await
        .unwrap();
    let err = Role::create(session.conn(), "admin", None).await.unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    UserRole::assign(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap();
    assert!(UserRole::has_role(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap());

    let err = UserRole::assign(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    let holders = UserRole::users_for_role(session.conn(), &role.id()).await.unwrap();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].username, "alice@acme.example");

    assert!(UserRole::remove(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap());
    assert!(!UserRole::has_role(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_role_delete_cascades_assignments() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let alice = create_user(&mut session, &domain.id(), "alice@acme.example").await;
    let role = Role::create(session.conn(), "admin", None).await.unwrap();
    UserRole::assign(session.conn(), &alice.id(), &role.id())
        .await
        .unwrap();

    Role::delete(session.conn(), &role.id()).await.unwrap();

    assert!(UserRole::roles_for_user(session.conn(), &alice.id())
        .await
        .unwrap()
        .is_empty());
    assert!(User::get(session.conn(), &alice.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_domain_delete_cascades_groups() {
    let pool = setup_pool().await;
    let mut session = Session::open(&pool).await.unwrap();

    let domain = create_domain(&mut session, "acme").await;
    let group = Group::create(
        session.conn(),
        CreateGroup {
            name: "staff".to_string(),
            description: None,
            domain_id: domain.id(),
        },
    )
    .await
    .unwrap();

    directory_db::models::Domain::delete(session.conn(), &domain.id())
        .await
        .unwrap();
    assert!(Group::get(session.conn(), &group.id()).await.unwrap().is_none());
}
