use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StoreError;
use crate::domain::order::{LineItem, Order, OrderStatus};

/// Persistence port for the order aggregate.
///
/// `update_items` and `change_status` apply the aggregate operation inside
/// whatever serialization the adapter provides for that order id, so two
/// requests racing on the same order cannot lose an update. `next_number`
/// must be strictly increasing and unique even under concurrent creates.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn list(&self) -> Result<Vec<Order>, StoreError>;
    async fn update_items(
        &self,
        id: Uuid,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;
    async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn next_number(&self) -> Result<u64, StoreError>;
}
