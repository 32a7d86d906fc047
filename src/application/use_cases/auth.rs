use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::user::{CurrentUser, LoginRequest, SignupRequest, User};
use crate::infrastructure::config::AuthConfig;
use crate::infrastructure::security::password::PasswordHasher;
use crate::infrastructure::users::UserRepository;

/// Local demo accounts: one signed-in user at a time, persisted between runs
pub struct AuthUseCase {
    repo: Arc<dyn UserRepository>,
    config: AuthConfig,
}

impl AuthUseCase {
    pub fn new(repo: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<CurrentUser> {
        request.validate()?;
        if request.password.chars().count() < self.config.min_password_length {
            return Err(AppError::ValidationError(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if request.email == self.config.demo_email {
            return Err(AppError::ValidationError(
                "email is reserved for the demo account".to_string(),
            ));
        }

        let salt = PasswordHasher::new_salt();
        let user = User {
            password_hash: PasswordHasher::hash(&request.password, &salt),
            salt,
            email: request.email,
            name: request.name.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        };
        let current = user.to_current();

        if !self.repo.insert_user(user).await? {
            warn!(email = %current.email, "Signup rejected, email already registered");
            return Err(AppError::ValidationError(format!(
                "an account for {} already exists",
                current.email
            )));
        }

        info!(email = %current.email, "Registered user");
        Ok(current)
    }

    /// Check credentials and remember the user as signed in
    pub async fn login(&self, request: LoginRequest) -> Result<CurrentUser> {
        let current = if request.email == self.config.demo_email
            && request.password == self.config.demo_password
        {
            CurrentUser {
                email: request.email,
                name: Some(self.config.demo_name.clone()),
            }
        } else {
            match self.repo.find_by_email(&request.email).await? {
                Some(user) if PasswordHasher::verify(&request.password, &user.salt, &user.password_hash) => {
                    user.to_current()
                }
                _ => {
                    warn!(email = %request.email, "Login rejected");
                    return Err(AppError::AuthError("invalid email or password".to_string()));
                }
            }
        };

        self.repo.save_current_user(&current).await?;
        info!(email = %current.email, "User signed in");
        Ok(current)
    }

    pub async fn current_user(&self) -> Result<Option<CurrentUser>> {
        self.repo.load_current_user().await
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current_user().await?.is_some())
    }

    pub async fn logout(&self) -> Result<()> {
        self.repo.clear_current_user().await?;
        info!("User signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::users::JsonUserRepository;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch() -> (AuthUseCase, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tablemerge_auth_{}", Uuid::new_v4()));
        let repo = Arc::new(JsonUserRepository::new(&dir));
        (AuthUseCase::new(repo, AuthConfig::default()), dir)
    }

    fn signup(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: Some("Ana".to_string()),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_demo_login() {
        let (auth, dir) = scratch();

        let user = auth.login(login("demo@project.com", "Dashboard123")).await.unwrap();
        assert_eq!(user.name.as_deref(), Some("Demo User"));
        assert!(auth.is_authenticated().await.unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_signup_login_logout() {
        let (auth, dir) = scratch();

        auth.signup(signup("ana@example.org", "secret1")).await.unwrap();
        assert!(!auth.is_authenticated().await.unwrap());

        let err = auth.login(login("ana@example.org", "wrong")).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        let user = auth.login(login("ana@example.org", "secret1")).await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), Some(user));

        auth.logout().await.unwrap();
        assert!(auth.current_user().await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_signup_rejections() {
        let (auth, dir) = scratch();

        assert!(matches!(
            auth.signup(signup("not-an-email", "secret1")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            auth.signup(signup("ana@example.org", "123")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            auth.signup(signup("demo@project.com", "secret1")).await,
            Err(AppError::ValidationError(_))
        ));

        auth.signup(signup("ana@example.org", "secret1")).await.unwrap();
        assert!(matches!(
            auth.signup(signup("ana@example.org", "secret2")).await,
            Err(AppError::ValidationError(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (auth, dir) = scratch();
        assert!(auth.login(login("ghost@example.org", "secret1")).await.is_err());
        assert!(auth.current_user().await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
