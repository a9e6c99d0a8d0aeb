pub mod order_service;
pub mod user_service;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::tokens::TokenService;
use order_service::OrderService;
use user_service::UserService;
use warehouse_types::ports::clock::Clock;
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;

/// Deadline for a single store call before the use case is aborted.
pub const DEFAULT_STORE_DEADLINE: Duration = Duration::from_secs(5);

/// Everything the inbound adapters share: both orchestrators, the token
/// service and the clock used to evaluate token expiry.
pub struct AppState<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub orders: OrderService<S, C>,
    pub users: UserService<S, C>,
    pub tokens: Arc<TokenService>,
    pub clock: C,
}

impl<S, C> AppState<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub fn new(store: S, clock: C, tokens: Arc<TokenService>) -> Self {
        Self {
            orders: OrderService::new(store.clone(), clock.clone()),
            users: UserService::new(store, clock.clone(), tokens.clone()),
            tokens,
            clock,
        }
    }

    pub fn with_store_deadline(mut self, deadline: Duration) -> Self {
        self.orders = self.orders.with_store_deadline(deadline);
        self.users = self.users.with_store_deadline(deadline);
        self
    }
}
