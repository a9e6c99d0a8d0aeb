//! User orchestrator: registration, login and role administration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::DEFAULT_STORE_DEADLINE;
use crate::auth::passwords;
use crate::auth::tokens::TokenService;
use crate::errors::AppError;
use crate::policy::{self, UserOp};
use warehouse_types::domain::user::{Claims, Role, User};
use warehouse_types::ports::clock::Clock;
use warehouse_types::ports::user_store::UserStore;
use warehouse_types::ports::StoreError;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub struct UserService<S: UserStore, C: Clock> {
    store: S,
    clock: C,
    tokens: Arc<TokenService>,
    store_deadline: Duration,
}

impl<S: UserStore, C: Clock> UserService<S, C> {
    pub fn new(store: S, clock: C, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            clock,
            tokens,
            store_deadline: DEFAULT_STORE_DEADLINE,
        }
    }

    pub fn with_store_deadline(mut self, deadline: Duration) -> Self {
        self.store_deadline = deadline;
        self
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_deadline, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::internal("storage deadline exceeded")),
        }
    }

    /// Registers a new account. New accounts are clients; employees are
    /// promoted afterwards via [`Self::change_role`].
    pub async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        if new_user.password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }
        let hash = passwords::hash_password(&new_user.password)?;
        let user = User::new(
            new_user.login,
            hash,
            new_user.first_name,
            new_user.last_name,
            new_user.email,
            Role::Client,
        )?;
        self.bounded(self.store.create_user(user)).await
    }

    /// Verifies credentials and issues a signed token. Unknown login and
    /// wrong password are indistinguishable to the caller.
    pub async fn login(&self, login: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self.bounded(self.store.find_by_login(login)).await?;
        let user = match user {
            Some(user) if passwords::verify_password(password, &user.password_hash) => user,
            _ => {
                tracing::debug!(%login, "login rejected");
                return Err(AppError::unauthorized("invalid login or password"));
            }
        };
        let token = self
            .tokens
            .issue(user.id, &user.login, user.role, self.clock.now())?;
        Ok((token, user))
    }

    /// Reads an account: employees may read anyone, clients only
    /// themselves.
    pub async fn get_user(&self, claims: &Claims, id: Uuid) -> Result<User, AppError> {
        if !policy::can_access_user(claims, id, UserOp::Read) {
            return Err(AppError::forbidden("account belongs to another user"));
        }
        match self.bounded(self.store.get_user(id)).await? {
            Some(user) => Ok(user),
            None => Err(AppError::not_found(format!("user {id}"))),
        }
    }

    /// Role changes are employee-only.
    pub async fn change_role(
        &self,
        claims: &Claims,
        id: Uuid,
        role: Role,
    ) -> Result<User, AppError> {
        if !policy::can_access_user(claims, id, UserOp::ChangeRole) {
            return Err(AppError::forbidden("role changes require an employee account"));
        }
        match self.bounded(self.store.update_role(id, role)).await? {
            Some(user) => Ok(user),
            None => Err(AppError::not_found(format!("user {id}"))),
        }
    }
}
