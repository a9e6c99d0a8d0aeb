//! Store adapters for the warehouse backend. Exactly one of them backs the
//! [`Store`] facade at runtime, picked by cargo feature and database URL.

#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::{Role, User};
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;
use warehouse_types::ports::StoreError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[derive(Clone)]
pub enum Store {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteStore),
}

#[cfg(feature = "sqlite")]
pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Store> {
    #[cfg(feature = "memory")]
    if database_url.is_none() {
        return Ok(Store::Memory(memory::InMemoryStore::new()));
    }
    let url = database_url.unwrap_or("sqlite://warehouse.db");
    Ok(Store::Sqlite(sqlite::SqliteStore::new(url).await?))
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
pub async fn build_store(_database_url: Option<&str>) -> anyhow::Result<Store> {
    Ok(Store::Memory(memory::InMemoryStore::new()))
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Store::Memory($store) => $call,
            #[cfg(feature = "sqlite")]
            Store::Sqlite($store) => $call,
        }
    };
}

#[async_trait]
impl OrderStore for Store {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        delegate!(self, store => store.create(order).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        delegate!(self, store => store.get(id).await)
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        delegate!(self, store => store.list().await)
    }

    async fn update_items(
        &self,
        id: Uuid,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        delegate!(self, store => store.update_items(id, items, now).await)
    }

    async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        delegate!(self, store => store.change_status(id, status, now).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        delegate!(self, store => store.delete(id).await)
    }

    async fn next_number(&self) -> Result<u64, StoreError> {
        delegate!(self, store => store.next_number().await)
    }
}

#[async_trait]
impl UserStore for Store {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        delegate!(self, store => store.create_user(user).await)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        delegate!(self, store => store.get_user(id).await)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        delegate!(self, store => store.find_by_login(login).await)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        delegate!(self, store => store.update_role(id, role).await)
    }
}
