#![cfg(feature = "sqlite")]

use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;
use warehouse_repo::sqlite::SqliteStore;
use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::{Role, User};
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;
use warehouse_types::ports::StoreError;

fn temp_db_url() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut path = PathBuf::from(dir.path());
    path.push(format!("warehouse-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (dir, url)
}

fn item(quantity: u32, sell_price_cents: u64) -> LineItem {
    LineItem {
        product_id: Uuid::new_v4(),
        quantity,
        sell_price_cents,
    }
}

#[tokio::test]
async fn order_crud_flow() {
    let (_dir, url) = temp_db_url();
    let store = SqliteStore::new(&url).await.unwrap();

    let owner = Uuid::new_v4();
    let number = store.next_number().await.unwrap();
    let order = Order::new(owner, number, vec![item(2, 500)], Utc::now()).unwrap();

    let created = store.create(order.clone()).await.unwrap();
    assert_eq!(created.id, order.id);

    let fetched = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.owner_user_id, owner);
    assert_eq!(fetched.total_cents, 1000);
    assert_eq!(fetched.items, order.items);

    let updated = store
        .update_items(order.id, vec![item(3, 100)], Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.total_cents, 300);

    let executed = store
        .change_status(order.id, OrderStatus::Executed, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(executed.status, OrderStatus::Executed);

    // Terminal status survives a reload.
    let reloaded = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, OrderStatus::Executed);

    assert!(store.delete(order.id).await.unwrap());
    assert!(store.get(order.id).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_transition_rolls_back() {
    let (_dir, url) = temp_db_url();
    let store = SqliteStore::new(&url).await.unwrap();
    let order = Order::new(Uuid::new_v4(), 1, vec![item(1, 100)], Utc::now()).unwrap();
    store.create(order.clone()).await.unwrap();
    store
        .change_status(order.id, OrderStatus::Deleted, Utc::now())
        .await
        .unwrap()
        .unwrap();

    let rejected = store
        .change_status(order.id, OrderStatus::Executed, Utc::now())
        .await;
    assert!(matches!(rejected, Err(StoreError::Rejected(_))));
    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Deleted);
}

#[tokio::test]
async fn order_numbers_come_from_the_counter_row() {
    let (_dir, url) = temp_db_url();
    let store = SqliteStore::new(&url).await.unwrap();
    let first = store.next_number().await.unwrap();
    let second = store.next_number().await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
}

#[tokio::test]
async fn user_store_round_trips_and_rejects_duplicates() {
    let (_dir, url) = temp_db_url();
    let store = SqliteStore::new(&url).await.unwrap();

    let user = User::new(
        "ada".into(),
        "hash".into(),
        "Ada".into(),
        "Lovelace".into(),
        "ada@example.com".into(),
        Role::Client,
    )
    .unwrap();
    store.create_user(user.clone()).await.unwrap();

    let found = store.find_by_login("ada").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.password_hash, "hash");

    let dup = User::new(
        "ada".into(),
        "hash2".into(),
        "B".into(),
        "C".into(),
        "b@example.com".into(),
        Role::Client,
    )
    .unwrap();
    assert!(matches!(
        store.create_user(dup).await,
        Err(StoreError::DuplicateLogin(_))
    ));

    let promoted = store
        .update_role(user.id, Role::Employee)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promoted.role, Role::Employee);
    assert!(store
        .update_role(Uuid::new_v4(), Role::Employee)
        .await
        .unwrap()
        .is_none());
}
