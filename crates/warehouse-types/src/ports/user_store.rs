use async_trait::async_trait;
use uuid::Uuid;

use super::StoreError;
use crate::domain::user::{Role, User};

/// Persistence port for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn create_user(&self, user: User) -> Result<User, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;
    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError>;
}
