//! Authorization policy: the single decision point for order and account
//! access, consulted by the orchestrators before every operation and shared
//! by both transports. Pure, no side effects.
//!
//! Employees may do anything to any order and read or administer any
//! account. Clients may create orders for themselves, read their own orders
//! and their own account; everything else is employee-only by policy (not a
//! technical limitation).

use uuid::Uuid;
use warehouse_types::domain::order::Order;
use warehouse_types::domain::user::{Claims, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOp {
    Create,
    Read,
    Update,
    Delete,
    ChangeStatus,
}

/// `owner_user_id` is the order's owner, or the would-be owner for
/// `Create` where no order exists yet.
pub fn can_access_order(claims: &Claims, owner_user_id: Uuid, op: OrderOp) -> bool {
    match claims.role {
        Role::Employee => true,
        Role::Client => match op {
            OrderOp::Create | OrderOp::Read => owner_user_id == claims.user_id,
            OrderOp::Update | OrderOp::Delete | OrderOp::ChangeStatus => false,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOp {
    Read,
    ChangeRole,
}

/// `target_user_id` is the account being operated on.
pub fn can_access_user(claims: &Claims, target_user_id: Uuid, op: UserOp) -> bool {
    match claims.role {
        Role::Employee => true,
        Role::Client => match op {
            UserOp::Read => target_user_id == claims.user_id,
            UserOp::ChangeRole => false,
        },
    }
}

/// Server-side list filter: employees see everything, clients only their
/// own orders. The full set never crosses the wire for a client.
pub fn visible_orders(claims: &Claims, orders: Vec<Order>) -> Vec<Order> {
    match claims.role {
        Role::Employee => orders,
        Role::Client => orders
            .into_iter()
            .filter(|order| order.owner_user_id == claims.user_id)
            .collect(),
    }
}
