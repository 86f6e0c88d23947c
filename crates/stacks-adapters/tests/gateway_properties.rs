//! Gateway and Model behaviour against the in-memory driver.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use stacks_adapters::{FixedClock, MemoryDriver, builtin_models};
use stacks_core::application::ApplicationError;
use stacks_core::domain::{CREATED_AT, UPDATED_AT};
use stacks_core::prelude::*;

struct Fixture {
    users: Gateway,
    clock: FixedClock,
    driver: MemoryDriver,
}

fn fixture() -> Fixture {
    let schema = Arc::new(builtin_models::user().unwrap());
    let driver = MemoryDriver::new().with_table(Arc::clone(&schema)).unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 22, 10, 0, 0).unwrap());
    let users = Gateway::new(
        Arc::new(driver.clone()),
        schema,
        Arc::new(clock.clone()),
    );
    Fixture {
        users,
        clock,
        driver,
    }
}

fn user(name: Option<&str>, email: &str) -> Row {
    Row::from([
        ("name".to_string(), Value::from(name)),
        ("email".to_string(), Value::from(email)),
        ("password".to_string(), Value::from("hunter2")),
    ])
}

fn set(column: &str, value: impl Into<Value>) -> Row {
    Row::from([(column.to_string(), value.into())])
}

async fn seed(f: &Fixture, count: usize) -> Vec<i64> {
    let mut ids = Vec::new();
    for n in 1..=count {
        let created = f
            .users
            .create(user(Some(&format!("user {n}")), &format!("{n}@example.com")))
            .await
            .unwrap();
        ids.push(created.id().unwrap());
        f.clock.advance(Duration::seconds(1));
    }
    ids
}

// ============================================================================
// Static gateway
// ============================================================================

#[tokio::test]
async fn find_after_create_returns_inserted_data_with_identity() {
    let f = fixture();
    let created = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();
    let id = created.id().unwrap();

    let found = f.users.find(id, None).await.unwrap().unwrap();

    assert_eq!(found.record(), created.record());
    assert_eq!(found.get("name"), Some(&Value::from("Ada")));
    assert_eq!(found.get("email"), Some(&Value::from("ada@example.com")));
    assert_eq!(found.get("password"), Some(&Value::from("hunter2")));
    assert!(matches!(found.get(CREATED_AT), Some(Value::Timestamp(_))));
}

#[tokio::test]
async fn null_criteria_use_is_null_semantics() {
    let f = fixture();
    f.users.create(user(None, "anon@example.com")).await.unwrap();
    f.users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();

    let unnamed = f
        .users
        .get(&Criteria::new().is_null("name"), &QueryOptions::new())
        .await
        .unwrap();

    assert_eq!(unnamed.len(), 1);
    assert_eq!(unnamed[0].get("email"), Some(&Value::from("anon@example.com")));

    let never_deleted = f
        .users
        .filter(&Criteria::new().is_null("deleted_at"), &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(never_deleted.len(), 2);
}

#[tokio::test]
async fn all_on_empty_table() {
    let f = fixture();

    let page = f
        .users
        .all(&QueryOptions::new().limit(10).page(1))
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.paging.total_records, 0);
    assert_eq!(page.paging.total_pages, 1);
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn all_returns_limit_rows_and_cursor_of_the_next_row() {
    let f = fixture();
    let ids = seed(&f, 7).await;

    let page = f.users.all(&QueryOptions::new().limit(3)).await.unwrap();

    assert_eq!(page.data.len(), 3);
    assert_eq!(page.next_cursor, Some(ids[3]));
    assert_eq!(page.paging.total_records, 7);
    assert_eq!(page.paging.total_pages, 3);

    let last = f
        .users
        .all(&QueryOptions::new().limit(3).page(3))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].id(), Some(ids[6]));
    assert_eq!(last.next_cursor, None);
    assert_eq!(last.paging.page, 3);
}

#[tokio::test]
async fn all_defaults_to_ten_per_page() {
    let f = fixture();
    seed(&f, 12).await;

    let page = f.users.all(&QueryOptions::new()).await.unwrap();

    assert_eq!(page.data.len(), 10);
    assert_eq!(page.paging.page, 1);
    assert_eq!(page.paging.total_pages, 2);
    assert!(page.has_more());
}

#[tokio::test]
async fn get_defaults_to_newest_first_and_honours_explicit_sort() {
    let f = fixture();
    let ids = seed(&f, 3).await;

    let newest_first: Vec<_> = f
        .users
        .get(&Criteria::new(), &QueryOptions::new())
        .await
        .unwrap()
        .iter()
        .filter_map(|m| m.id())
        .collect();
    assert_eq!(newest_first, vec![ids[2], ids[1], ids[0]]);

    let by_email: Vec<_> = f
        .users
        .get(
            &Criteria::new(),
            &QueryOptions::new().sort(Sort::asc("email")).limit(2),
        )
        .await
        .unwrap()
        .iter()
        .filter_map(|m| m.id())
        .collect();
    assert_eq!(by_email, vec![ids[0], ids[1]]);
}

#[tokio::test]
async fn find_many_ignores_missing_identities() {
    let f = fixture();
    let ids = seed(&f, 3).await;

    let found = f
        .users
        .find_many(&[ids[2], 999, ids[0]], None)
        .await
        .unwrap();
    let found: Vec<_> = found.iter().filter_map(|m| m.id()).collect();

    assert_eq!(found, vec![ids[0], ids[2]]);
    assert!(f.users.find_many(&[404], None).await.unwrap().is_empty());
}

#[tokio::test]
async fn where_in_with_empty_list_matches_nothing() {
    let f = fixture();
    seed(&f, 2).await;

    let found = f
        .users
        .where_in("id", Vec::new(), &QueryOptions::new())
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn create_with_duplicate_email_is_a_constraint_violation() {
    let f = fixture();
    f.users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();

    let err = f
        .users
        .create(user(Some("Imposter"), "ada@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StacksError::Application(ApplicationError::ConstraintViolation { .. })
    ));
    assert_eq!(f.users.count(&Criteria::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn static_update_and_remove_of_missing_rows_are_none() {
    let f = fixture();

    assert!(f.users.update(42, set("name", "x")).await.unwrap().is_none());
    assert!(f.users.remove(42).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_returns_prior_state() {
    let f = fixture();
    let ids = seed(&f, 1).await;

    let removed = f.users.remove(ids[0]).await.unwrap().unwrap();

    assert_eq!(removed.get("email"), Some(&Value::from("1@example.com")));
    assert!(f.users.find(ids[0], None).await.unwrap().is_none());
}

#[tokio::test]
async fn update_stamps_updated_at_only() {
    let f = fixture();
    let created = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();
    f.clock.advance(Duration::minutes(5));

    let updated = f
        .users
        .update(created.id().unwrap(), set("name", "Ada L."))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.get(CREATED_AT), created.get(CREATED_AT));
    assert_ne!(updated.get(UPDATED_AT), created.get(UPDATED_AT));
}

#[tokio::test]
async fn first_and_last_follow_identity_order() {
    let f = fixture();
    assert!(f.users.first().await.unwrap().is_none());

    let ids = seed(&f, 3).await;

    assert_eq!(f.users.first().await.unwrap().unwrap().id(), Some(ids[0]));
    assert_eq!(f.users.last().await.unwrap().unwrap().id(), Some(ids[2]));
}

#[tokio::test]
async fn scenario_create_find_by_email_update_find() {
    let f = fixture();
    f.users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();

    let ada = f
        .users
        .find_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    let id = ada.id().unwrap();
    assert_eq!(ada.get("email"), Some(&Value::from("ada@example.com")));

    assert!(f.users.find_by_email("ADA@example.com").await.unwrap().is_none());

    f.users.update(id, set("name", "Ada L.")).await.unwrap();

    let found = f.users.find(id, None).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&Value::from("Ada L.")));
}

// ============================================================================
// Instance gateway
// ============================================================================

#[tokio::test]
async fn instance_update_after_foreign_delete_fails_and_keeps_state() {
    let f = fixture();
    let mut ada = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();
    let before = ada.record().clone();

    f.users.remove(ada.id().unwrap()).await.unwrap();
    let err = ada.update(set("name", "Ada L.")).await.unwrap_err();

    assert!(err.is_record_not_found());
    assert_eq!(ada.record(), &before);
}

#[tokio::test]
async fn delete_clears_state_and_refresh_then_fails() {
    let f = fixture();
    let mut ada = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();

    ada.delete().await.unwrap();

    assert!(ada.record().is_empty());
    assert_eq!(ada.state(), RecordState::Deleted);
    assert!(ada.refresh().await.is_err());
    assert!(f.driver.is_empty("users").unwrap());
}

#[tokio::test]
async fn transient_model_saves_then_updates() {
    let f = fixture();
    let mut grace = Model::new(f.users.clone(), user(Some("Grace"), "grace@example.com")).unwrap();
    assert_eq!(grace.state(), RecordState::Transient);
    assert!(grace.refresh().await.is_err());

    grace.save().await.unwrap();
    let id = grace.id().unwrap();
    assert_eq!(grace.state(), RecordState::Persisted);

    grace.fill(set("name", "Grace H.")).unwrap();
    assert_eq!(grace.state(), RecordState::Dirty);
    grace.save().await.unwrap();

    let stored = f.users.find(id, None).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&Value::from("Grace H.")));
}

#[tokio::test]
async fn refresh_adopts_foreign_writes() {
    let f = fixture();
    let mut ada = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();

    f.users
        .update(ada.id().unwrap(), set("name", "Countess"))
        .await
        .unwrap();
    ada.refresh().await.unwrap();

    assert_eq!(ada.get("name"), Some(&Value::from("Countess")));
}

#[tokio::test]
async fn concurrent_instance_updates_are_last_write_wins() {
    let f = fixture();
    let created = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();
    let id = created.id().unwrap();

    let mut first = f.users.find(id, None).await.unwrap().unwrap();
    let mut second = f.users.find(id, None).await.unwrap().unwrap();

    first.update(set("name", "first")).await.unwrap();
    // No version check: the second writer silently overwrites the first.
    second.update(set("name", "second")).await.unwrap();

    let stored = f.users.find(id, None).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&Value::from("second")));
    assert_eq!(first.get("name"), Some(&Value::from("first")));
}

#[tokio::test]
async fn instance_filter_only_sees_its_own_row() {
    let f = fixture();
    let ids = seed(&f, 3).await;
    let model = f.users.find(ids[1], None).await.unwrap().unwrap();

    let mine = model
        .filter(&Criteria::new(), &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id(), Some(ids[1]));

    let others = model
        .where_in("id", vec![Value::from(ids[0])], &QueryOptions::new())
        .await
        .unwrap();
    assert!(others.is_empty());
}

// ============================================================================
// Hidden columns
// ============================================================================

#[tokio::test]
async fn hidden_columns_never_serialize() {
    let f = fixture();
    let ada = f
        .users
        .create(user(Some("Ada"), "ada@example.com"))
        .await
        .unwrap();
    seed(&f, 2).await;

    let json = serde_json::to_string(&ada).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(ada.to_json().get("password").is_none());
    assert!(!format!("{ada:?}").contains("hunter2"));

    let page = f.users.all(&QueryOptions::new()).await.unwrap();
    let json = serde_json::to_string(&page).unwrap();
    assert!(!json.contains("password"));
    assert!(json.contains("next_cursor"));

    let projected = f
        .users
        .find(ada.id().unwrap(), Some(&["email", "password"][..]))
        .await
        .unwrap()
        .unwrap();
    assert!(!serde_json::to_string(&projected).unwrap().contains("hunter2"));
}
