//! warehouse-hex: order-management core (auth, policy, orchestrators)
//! plus the two inbound adapters (HTTP and RPC).

pub mod auth;
pub mod config;
pub mod errors;
pub mod policy;

pub mod application;

pub use warehouse_types::{domain, ports};

pub mod inbound; // HTTP + RPC adapters
