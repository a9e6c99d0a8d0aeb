pub mod clock;
pub mod order_store;
pub mod user_store;

use crate::domain::order::OrderError;

/// Failures surfaced by store adapters. `Backend` covers anything the
/// underlying engine reports; `Rejected` carries a domain rule the store
/// evaluated under its per-id serialization.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Rejected(#[from] OrderError),

    #[error("login already taken: {0}")]
    DuplicateLogin(String),
}
