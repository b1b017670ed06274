use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use clinic_persistence::{ClinicStore, UserRepository};
use clinic_types::{Profile, User};

const MIN_USERNAME_LENGTH: usize = 3;

/// Username/password accounts and guest sessions over the local store.
pub struct AuthService {
    users: UserRepository,
    store: ClinicStore,
    login_latency: Duration,
    signup_latency: Duration,
}

impl AuthService {
    pub fn new(store: ClinicStore, login_latency: Duration, signup_latency: Duration) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            store,
            login_latency,
            signup_latency,
        }
    }

    pub fn without_latency(store: ClinicStore) -> Self {
        Self::new(store, Duration::ZERO, Duration::ZERO)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        simulate_latency(self.login_latency).await;

        let mut user = self
            .users
            .get_user_by_username(username)
            .await
            .ok_or(AuthError::UserNotFound)?;

        if user.password.as_deref() != Some(hash_password(password).as_str()) {
            debug!("Rejected password for {}", user.username);
            return Err(AuthError::IncorrectPassword);
        }

        user.last_login = chrono::Utc::now().timestamp_millis();
        self.users.save_user(&user).await;
        self.store.set_session(&user.id).await;

        info!("{} clocked in", user.username);
        Ok(user)
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<User, AuthError> {
        simulate_latency(self.signup_latency).await;

        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(AuthError::UsernameTooShort);
        }
        if self.users.get_user_by_username(username).await.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let now = chrono::Utc::now().timestamp_millis();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password: Some(hash_password(password)),
            is_ai: false,
            is_guest: false,
            profile: Profile::starting(),
            created_at: now,
            last_login: now,
        };

        self.users.save_user(&user).await;
        self.store.set_session(&user.id).await;

        info!("New doctor hired: {}", user.username);
        Ok(user)
    }

    /// Ephemeral session user. Never persisted.
    pub fn create_guest_user(&self) -> User {
        let now = chrono::Utc::now().timestamp_millis();
        User {
            id: format!("guest_{}", Uuid::new_v4()),
            username: "Guest Doctor".to_string(),
            password: None,
            is_ai: false,
            is_guest: true,
            profile: Profile::starting(),
            created_at: now,
            last_login: now,
        }
    }

    pub async fn logout(&self) {
        self.store.clear_session().await;
    }

    pub async fn get_current_user(&self) -> Option<User> {
        let user_id = self.store.get_session().await?;
        self.users.get_user_by_id(&user_id).await
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// Hex-encoded SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Doctor not found! Check your ID badge (username).")]
    UserNotFound,
    #[error("Incorrect password! Try again.")]
    IncorrectPassword,
    #[error("Username too short!")]
    UsernameTooShort,
    #[error("That doctor already works here!")]
    UsernameTaken,
}
