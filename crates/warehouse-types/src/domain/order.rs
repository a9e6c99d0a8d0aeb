use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rejections raised by the order aggregate itself, independent of any
/// transport or storage concern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order must contain at least one line item")]
    EmptyItems,

    #[error("line item quantity must be > 0")]
    ZeroQuantity,

    #[error("order total overflows the money range")]
    TotalOverflow,

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is {0:?} and can no longer be edited")]
    NotEditable(OrderStatus),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Active,
    Executed,
    Deleted,
}

impl OrderStatus {
    /// Forward-only transition graph: `Active -> Executed` and
    /// `Active -> Deleted`. Both target states are terminal.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Active, OrderStatus::Executed)
                | (OrderStatus::Active, OrderStatus::Deleted)
        )
    }
}

/// A product line captured into an order. The sell price is frozen at
/// order time so later catalog changes never alter historical orders.
/// All money is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub sell_price_cents: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Monotonic order number, assigned by the store at creation.
    pub number: u64,
    pub owner_user_id: Uuid,
    pub items: Vec<LineItem>,
    pub total_cents: u64,
    pub status: OrderStatus,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl Order {
    pub fn new(
        owner_user_id: Uuid,
        number: u64,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let total_cents = total_cents(&items)?;
        Ok(Self {
            id: Uuid::new_v4(),
            number,
            owner_user_id,
            items,
            total_cents,
            status: OrderStatus::Active,
            created_date: now,
            last_modified_date: now,
        })
    }

    /// Replaces the line items and recomputes the total. Only `Active`
    /// orders can be edited.
    pub fn replace_items(
        &mut self,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status != OrderStatus::Active {
            return Err(OrderError::NotEditable(self.status));
        }
        let total_cents = total_cents(&items)?;
        self.items = items;
        self.total_cents = total_cents;
        self.last_modified_date = now;
        Ok(())
    }

    /// Applies a status transition, leaving the order untouched when the
    /// transition is not admitted by the graph.
    pub fn change_status(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.last_modified_date = now;
        Ok(())
    }
}

fn total_cents(items: &[LineItem]) -> Result<u64, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }
    let mut total: u64 = 0;
    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }
        let line = u64::from(item.quantity)
            .checked_mul(item.sell_price_cents)
            .ok_or(OrderError::TotalOverflow)?;
        total = total.checked_add(line).ok_or(OrderError::TotalOverflow)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, sell_price_cents: u64) -> LineItem {
        LineItem {
            product_id: Uuid::new_v4(),
            quantity,
            sell_price_cents,
        }
    }

    #[test]
    fn new_order_computes_total_and_starts_active() {
        let order = Order::new(
            Uuid::new_v4(),
            1,
            vec![item(2, 500), item(1, 250)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.total_cents, 1250);
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.created_date, order.last_modified_date);
    }

    #[test]
    fn empty_and_zero_quantity_items_are_rejected() {
        let empty = Order::new(Uuid::new_v4(), 1, vec![], Utc::now());
        assert_eq!(empty.unwrap_err(), OrderError::EmptyItems);

        let zero_qty = Order::new(Uuid::new_v4(), 1, vec![item(0, 100)], Utc::now());
        assert_eq!(zero_qty.unwrap_err(), OrderError::ZeroQuantity);
    }

    #[test]
    fn total_overflow_is_a_defined_failure() {
        let overflow = Order::new(Uuid::new_v4(), 1, vec![item(2, u64::MAX)], Utc::now());
        assert_eq!(overflow.unwrap_err(), OrderError::TotalOverflow);

        let accumulated = Order::new(
            Uuid::new_v4(),
            1,
            vec![item(1, u64::MAX), item(1, 1)],
            Utc::now(),
        );
        assert_eq!(accumulated.unwrap_err(), OrderError::TotalOverflow);
    }

    #[test]
    fn replace_items_recomputes_total_and_bumps_timestamp() {
        let created = Utc::now();
        let mut order = Order::new(Uuid::new_v4(), 1, vec![item(2, 500)], created).unwrap();
        let later = created + chrono::Duration::seconds(5);
        order.replace_items(vec![item(3, 100)], later).unwrap();
        assert_eq!(order.total_cents, 300);
        assert_eq!(order.last_modified_date, later);
        assert_eq!(order.created_date, created);
    }

    #[test]
    fn replace_items_rejects_empty_and_non_active() {
        let mut order = Order::new(Uuid::new_v4(), 1, vec![item(1, 100)], Utc::now()).unwrap();
        assert_eq!(
            order.replace_items(vec![], Utc::now()).unwrap_err(),
            OrderError::EmptyItems
        );

        order.change_status(OrderStatus::Executed, Utc::now()).unwrap();
        assert_eq!(
            order.replace_items(vec![item(1, 100)], Utc::now()).unwrap_err(),
            OrderError::NotEditable(OrderStatus::Executed)
        );
    }

    #[test]
    fn only_forward_transitions_are_admitted() {
        let mut order = Order::new(Uuid::new_v4(), 1, vec![item(1, 100)], Utc::now()).unwrap();
        order.change_status(OrderStatus::Executed, Utc::now()).unwrap();

        let back = order.change_status(OrderStatus::Active, Utc::now());
        assert_eq!(
            back.unwrap_err(),
            OrderError::InvalidTransition {
                from: OrderStatus::Executed,
                to: OrderStatus::Active,
            }
        );
        // A rejected attempt leaves the stored status unchanged.
        assert_eq!(order.status, OrderStatus::Executed);

        let mut deleted = Order::new(Uuid::new_v4(), 2, vec![item(1, 100)], Utc::now()).unwrap();
        deleted.change_status(OrderStatus::Deleted, Utc::now()).unwrap();
        assert!(deleted
            .change_status(OrderStatus::Executed, Utc::now())
            .is_err());
        assert_eq!(deleted.status, OrderStatus::Deleted);
    }
}
