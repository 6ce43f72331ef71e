//! Repository integration tests. These run against a live Postgres and are
//! ignored by default:
//!
//! ```sh
//! DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use ers_backend::error::RepoError;
use ers_backend::model::reimbursement::{NewReimbursement, ReimbType};
use ers_backend::model::role::Role;
use ers_backend::model::user::{NewUser, UserUpdate};
use ers_backend::repository::{ReimbRepository, UserRepository};
use ers_backend::repository::user::UserKey;

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to test database");

    sqlx::migrate!().run(&pool).await.expect("migrations failed");

    pool
}

fn unique_user(role: Role) -> NewUser {
    let tag = Uuid::new_v4().simple().to_string();
    NewUser {
        username: format!("user_{tag}"),
        password: "hunter2".into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        email: format!("{tag}@test.local"),
        role,
    }
}

async fn seeded_author(users: &UserRepository) -> i64 {
    users.save(unique_user(Role::Employee)).await.unwrap().id
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn save_assigns_fresh_ids_and_role_round_trips() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool);

    let a = users.save(unique_user(Role::Employee)).await.unwrap();
    let b = users.save(unique_user(Role::Manager)).await.unwrap();
    assert_ne!(a.id, b.id);

    let fetched = users.get_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(fetched.role, "Employee");
    assert_eq!(fetched.username, a.username);

    let by_name = users
        .get_by_unique_key(UserKey::Username, &a.username)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, a.id);
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn duplicate_username_is_a_conflict() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool);

    let first = unique_user(Role::Employee);
    let mut second = unique_user(Role::Employee);
    second.username = first.username.clone();

    users.save(first).await.unwrap();
    let err = users.save(second).await.unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn credentials_verify_against_the_stored_hash() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool);

    let new_user = unique_user(Role::Employee);
    let username = new_user.username.clone();
    let saved = users.save(new_user).await.unwrap();

    // hashed at rest
    assert_ne!(saved.password, "hunter2");
    assert!(saved.password.starts_with("$argon2"));

    let hit = users.get_by_credentials(&username, "hunter2").await.unwrap();
    assert_eq!(hit.map(|u| u.id), Some(saved.id));

    let miss = users.get_by_credentials(&username, "wrong").await.unwrap();
    assert!(miss.is_none());

    let absent = users
        .get_by_credentials("no_such_user", "hunter2")
        .await
        .unwrap();
    assert!(absent.is_none());
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn update_overwrites_and_reports_missing_rows() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool);

    let saved = users.save(unique_user(Role::Employee)).await.unwrap();

    let updated = users
        .update(
            saved.id,
            UserUpdate {
                username: saved.username.clone(),
                password: None,
                first_name: "Renamed".into(),
                last_name: saved.last_name.clone(),
                email: saved.email.clone(),
                role: Role::Manager,
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let fetched = users.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched.first_name, "Renamed");
    assert_eq!(fetched.role, "Manager");
    // untouched password keeps the old hash
    assert_eq!(fetched.password, saved.password);

    let missing = users
        .update(
            i64::MAX,
            UserUpdate {
                username: "ghost".into(),
                password: None,
                first_name: "G".into(),
                last_name: "Host".into(),
                email: "ghost@test.local".into(),
                role: Role::Employee,
            },
        )
        .await
        .unwrap();
    assert!(!missing);
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn delete_reports_zero_rows_for_missing_ids() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool);

    let saved = users.save(unique_user(Role::Employee)).await.unwrap();
    assert!(users.delete_by_id(saved.id).await.unwrap());
    assert!(!users.delete_by_id(saved.id).await.unwrap());
    assert!(!users.delete_by_id(i64::MAX).await.unwrap());
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn new_reimbursement_is_always_pending() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let author_id = seeded_author(&users).await;

    let saved = reimbs
        .save(NewReimbursement {
            amount: 42.5,
            description: "Train ticket".into(),
            reimb_type: ReimbType::Travel,
            author_id,
        })
        .await
        .unwrap();

    assert_eq!(saved.status, "Pending");
    assert!(saved.resolver_id.is_none());
    assert!(saved.resolved.is_none());

    let fetched = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, "Pending");
    assert_eq!(fetched.reimb_type, "Travel");
    assert_eq!(fetched.author_id, author_id);
    assert!(fetched.resolver_id.is_none());
    assert!(fetched.resolved.is_none());
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn resolution_happens_exactly_once() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let author_id = seeded_author(&users).await;
    let resolver_id = users.save(unique_user(Role::Manager)).await.unwrap().id;

    let saved = reimbs
        .save(NewReimbursement {
            amount: 10.0,
            description: "Lunch".into(),
            reimb_type: ReimbType::Food,
            author_id,
        })
        .await
        .unwrap();

    reimbs
        .resolve_status(saved.id, "Approved", resolver_id)
        .await
        .unwrap();

    let resolved = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(resolved.status, "Approved");
    assert_eq!(resolved.resolver_id, Some(resolver_id));
    assert!(resolved.resolved.is_some());

    // second resolution must conflict, not overwrite
    let err = reimbs
        .resolve_status(saved.id, "Denied", author_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadyResolved));

    let unchanged = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, "Approved");
    assert_eq!(unchanged.resolver_id, Some(resolver_id));
    assert_eq!(unchanged.resolved, resolved.resolved);
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn resolution_rejects_bad_targets_and_missing_rows() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let resolver_id = users.save(unique_user(Role::Manager)).await.unwrap().id;

    let err = reimbs
        .resolve_status(i64::MAX, "Approved", resolver_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    let err = reimbs
        .resolve_status(1, "Reimbursed", resolver_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::UnknownEnum { .. }));

    let err = reimbs
        .resolve_status(1, "Pending", resolver_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Invalid(_)));
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn update_fields_never_touches_the_lifecycle() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let author_id = seeded_author(&users).await;
    let resolver_id = users.save(unique_user(Role::Manager)).await.unwrap().id;

    let saved = reimbs
        .save(NewReimbursement {
            amount: 100.0,
            description: "Hotel".into(),
            reimb_type: ReimbType::Lodging,
            author_id,
        })
        .await
        .unwrap();

    // edit while pending
    assert!(
        reimbs
            .update_fields(saved.id, 120.0, "Hotel, two nights", "Lodging")
            .await
            .unwrap()
    );

    let edited = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(edited.amount, 120.0);
    assert_eq!(edited.status, "Pending");
    assert!(edited.resolver_id.is_none());
    assert!(edited.resolved.is_none());

    // edit after resolution leaves the lifecycle columns alone too
    reimbs
        .resolve_status(saved.id, "Denied", resolver_id)
        .await
        .unwrap();
    assert!(
        reimbs
            .update_fields(saved.id, 99.0, "Hotel, adjusted", "Other")
            .await
            .unwrap()
    );

    let after = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(after.amount, 99.0);
    assert_eq!(after.reimb_type, "Other");
    assert_eq!(after.status, "Denied");
    assert_eq!(after.resolver_id, Some(resolver_id));
    assert!(after.resolved.is_some());
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn unknown_type_on_write_paths_is_a_validation_error() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let author_id = seeded_author(&users).await;

    let saved = reimbs
        .save(NewReimbursement {
            amount: 5.0,
            description: "Snacks".into(),
            reimb_type: ReimbType::Food,
            author_id,
        })
        .await
        .unwrap();

    let err = reimbs
        .update_fields(saved.id, 5.0, "Snacks", "Jetski")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnknownEnum {
            domain: "reimbursement type",
            ..
        }
    ));

    // failed update leaves the row untouched
    let unchanged = reimbs.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(unchanged.reimb_type, "Food");
}

#[actix_web::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn author_and_status_listings_filter_correctly() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let reimbs = ReimbRepository::new(pool);

    let author_id = seeded_author(&users).await;
    let other_id = seeded_author(&users).await;

    for _ in 0..2 {
        reimbs
            .save(NewReimbursement {
                amount: 1.0,
                description: "Bus fare".into(),
                reimb_type: ReimbType::Travel,
                author_id,
            })
            .await
            .unwrap();
    }
    reimbs
        .save(NewReimbursement {
            amount: 1.0,
            description: "Bus fare".into(),
            reimb_type: ReimbType::Travel,
            author_id: other_id,
        })
        .await
        .unwrap();

    let mine = reimbs.get_all_by_author(author_id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.author_id == author_id));

    let pending = reimbs.get_all_by_status("Pending").await.unwrap();
    assert!(pending.iter().all(|r| r.status == "Pending"));
    assert!(pending.len() >= 3);
}
