use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A locally registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_current(&self) -> CurrentUser {
        CurrentUser {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// The signed-in user as persisted between runs and returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_email_validation() {
        let ok = SignupRequest {
            email: "ana@example.org".into(),
            password: "secret1".into(),
            name: None,
        };
        assert!(ok.validate().is_ok());

        let bad = SignupRequest {
            email: "not-an-email".into(),
            ..ok
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_current_user_drops_credentials() {
        let user = User {
            email: "ana@example.org".into(),
            name: Some("Ana".into()),
            password_hash: "ab".into(),
            salt: "cd".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user.to_current()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(json.contains("Ana"));
    }
}
