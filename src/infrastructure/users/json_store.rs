use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use super::UserRepository;
use crate::domain::error::Result;
use crate::domain::user::{CurrentUser, User};
use crate::infrastructure::storage::{atomic_write_bytes, read_optional, remove_if_exists};

const USERS_FILE: &str = "users.json";
const CURRENT_USER_FILE: &str = "current_user.json";

/// Accounts in `users.json`, the signed-in user in `current_user.json`.
/// A missing file is an empty store.
pub struct JsonUserRepository {
    users_path: PathBuf,
    current_user_path: PathBuf,
    write_lock: AsyncMutex<()>,
}

impl JsonUserRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            users_path: data_dir.join(USERS_FILE),
            current_user_path: data_dir.join(CURRENT_USER_FILE),
            write_lock: AsyncMutex::new(()),
        }
    }

    async fn read_users(&self) -> Result<Vec<User>> {
        match read_optional(&self.users_path).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read_users()
            .await?
            .into_iter()
            .find(|u| u.email == email))
    }

    async fn insert_user(&self, user: User) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_users().await?;
        if users.iter().any(|u| u.email == user.email) {
            return Ok(false);
        }
        users.push(user);

        let bytes = serde_json::to_vec_pretty(&users)?;
        atomic_write_bytes(&self.users_path, &bytes).await?;
        Ok(true)
    }

    async fn load_current_user(&self) -> Result<Option<CurrentUser>> {
        let Some(bytes) = read_optional(&self.current_user_path).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.current_user_path.display(),
                    "Discarding unreadable current user file"
                );
                Ok(None)
            }
        }
    }

    async fn save_current_user(&self, user: &CurrentUser) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let bytes = serde_json::to_vec(user)?;
        atomic_write_bytes(&self.current_user_path, &bytes).await
    }

    async fn clear_current_user(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        remove_if_exists(&self.current_user_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn scratch_repo() -> (JsonUserRepository, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tablemerge_users_{}", Uuid::new_v4()));
        (JsonUserRepository::new(&dir), dir)
    }

    fn user(email: &str) -> User {
        User {
            email: email.to_string(),
            name: None,
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let (repo, dir) = scratch_repo();

        assert!(repo.insert_user(user("a@example.org")).await.unwrap());
        assert!(!repo.insert_user(user("a@example.org")).await.unwrap());
        assert!(repo.insert_user(user("b@example.org")).await.unwrap());

        assert_eq!(repo.read_users().await.unwrap().len(), 2);
        assert!(repo.find_by_email("b@example.org").await.unwrap().is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_current_user_lifecycle() {
        let (repo, dir) = scratch_repo();
        assert!(repo.load_current_user().await.unwrap().is_none());

        let current = CurrentUser {
            email: "a@example.org".to_string(),
            name: Some("A".to_string()),
        };
        repo.save_current_user(&current).await.unwrap();
        assert_eq!(repo.load_current_user().await.unwrap(), Some(current));

        repo.clear_current_user().await.unwrap();
        assert!(repo.load_current_user().await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
