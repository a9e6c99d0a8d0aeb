use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::{Role, User};
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;
use warehouse_types::ports::StoreError;

/// In-memory store. DashMap's `get_mut` holds the shard entry lock for the
/// duration of a read-then-write, which serializes racing mutations of the
/// same order id; the atomic counter keeps order numbers strictly
/// increasing and unique under concurrent creates.
#[derive(Clone)]
pub struct InMemoryStore {
    orders: Arc<DashMap<Uuid, Order>>,
    users: Arc<DashMap<Uuid, User>>,
    logins: Arc<DashMap<String, Uuid>>,
    order_seq: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            logins: Arc::new(DashMap::new()),
            order_seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn update_items(
        &self,
        id: Uuid,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        if let Some(mut entry) = self.orders.get_mut(&id) {
            entry.replace_items(items, now)?;
            return Ok(Some(entry.clone()));
        }
        Ok(None)
    }

    async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        if let Some(mut entry) = self.orders.get_mut(&id) {
            entry.change_status(status, now)?;
            return Ok(Some(entry.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.remove(&id).is_some())
    }

    async fn next_number(&self) -> Result<u64, StoreError> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        // The login index entry doubles as a uniqueness lock.
        match self.logins.entry(user.login.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::DuplicateLogin(user.login))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let id = match self.logins.get(login) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        if let Some(mut entry) = self.users.get_mut(&id) {
            entry.role = role;
            return Ok(Some(entry.clone()));
        }
        Ok(None)
    }
}
