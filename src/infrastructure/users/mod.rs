mod json_store;

pub use json_store::JsonUserRepository;

use crate::domain::error::Result;
use crate::domain::user::{CurrentUser, User};
use async_trait::async_trait;

/// Persistence for local accounts and the signed-in user
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Returns `false` when the email is already registered
    async fn insert_user(&self, user: User) -> Result<bool>;

    async fn load_current_user(&self) -> Result<Option<CurrentUser>>;
    async fn save_current_user(&self, user: &CurrentUser) -> Result<()>;
    async fn clear_current_user(&self) -> Result<()>;
}
