//! Order orchestrator. Every use case runs the same sequence: load the
//! target (when one exists), consult the authorization policy, invoke the
//! aggregate operation through the store, and wrap any failure as an
//! [`AppError`] before it leaves this layer. No transport type crosses
//! this boundary in either direction.

use std::future::Future;
use std::time::Duration;

use uuid::Uuid;

use crate::errors::AppError;
use crate::policy::{self, OrderOp};
use super::DEFAULT_STORE_DEADLINE;
use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::Claims;
use warehouse_types::ports::clock::Clock;
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::StoreError;

pub struct OrderService<S: OrderStore, C: Clock> {
    store: S,
    clock: C,
    store_deadline: Duration,
}

impl<S: OrderStore, C: Clock> OrderService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            store_deadline: DEFAULT_STORE_DEADLINE,
        }
    }

    pub fn with_store_deadline(mut self, deadline: Duration) -> Self {
        self.store_deadline = deadline;
        self
    }

    /// Bounds a store call with the configured deadline. An elapsed
    /// deadline aborts the use case; there is no retry at this layer.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_deadline, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::internal("storage deadline exceeded")),
        }
    }

    async fn load(&self, id: Uuid) -> Result<Order, AppError> {
        match self.bounded(self.store.get(id)).await? {
            Some(order) => Ok(order),
            None => Err(AppError::not_found(format!("order {id}"))),
        }
    }

    /// Creates an order. A missing owner defaults to the caller; clients
    /// may only create for themselves, employees for anyone.
    pub async fn create_order(
        &self,
        claims: &Claims,
        owner_user_id: Option<Uuid>,
        items: Vec<LineItem>,
    ) -> Result<Order, AppError> {
        let owner = owner_user_id.unwrap_or(claims.user_id);
        if !policy::can_access_order(claims, owner, OrderOp::Create) {
            return Err(AppError::forbidden(
                "not allowed to create orders for another user",
            ));
        }
        let number = self.bounded(self.store.next_number()).await?;
        let order = Order::new(owner, number, items, self.clock.now())?;
        self.bounded(self.store.create(order)).await
    }

    pub async fn get_order(&self, claims: &Claims, id: Uuid) -> Result<Order, AppError> {
        let order = self.load(id).await?;
        if !policy::can_access_order(claims, order.owner_user_id, OrderOp::Read) {
            return Err(AppError::forbidden("order belongs to another user"));
        }
        Ok(order)
    }

    pub async fn list_orders(&self, claims: &Claims) -> Result<Vec<Order>, AppError> {
        let orders = self.bounded(self.store.list()).await?;
        Ok(policy::visible_orders(claims, orders))
    }

    pub async fn update_order(
        &self,
        claims: &Claims,
        id: Uuid,
        items: Vec<LineItem>,
    ) -> Result<Order, AppError> {
        let order = self.load(id).await?;
        if !policy::can_access_order(claims, order.owner_user_id, OrderOp::Update) {
            return Err(AppError::forbidden("order updates require an employee account"));
        }
        match self
            .bounded(self.store.update_items(id, items, self.clock.now()))
            .await?
        {
            Some(updated) => Ok(updated),
            None => Err(AppError::not_found(format!("order {id}"))),
        }
    }

    pub async fn change_status(
        &self,
        claims: &Claims,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self.load(id).await?;
        if !policy::can_access_order(claims, order.owner_user_id, OrderOp::ChangeStatus) {
            return Err(AppError::forbidden(
                "status changes require an employee account",
            ));
        }
        match self
            .bounded(self.store.change_status(id, status, self.clock.now()))
            .await?
        {
            Some(updated) => Ok(updated),
            None => Err(AppError::not_found(format!("order {id}"))),
        }
    }

    /// Hard delete: removes the aggregate permanently. Not idempotent;
    /// a second delete of the same id is `NotFound`.
    pub async fn delete_order(&self, claims: &Claims, id: Uuid) -> Result<(), AppError> {
        let order = self.load(id).await?;
        if !policy::can_access_order(claims, order.owner_user_id, OrderOp::Delete) {
            return Err(AppError::forbidden("order deletion requires an employee account"));
        }
        let deleted = self.bounded(self.store.delete(id)).await?;
        if deleted {
            Ok(())
        } else {
            Err(AppError::not_found(format!("order {id}")))
        }
    }
}
