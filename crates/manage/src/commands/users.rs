//! API user management.

use anyhow::{anyhow, bail};
use tdm_api::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use tdm_db::models::user::{CreateUser, User};
use tdm_db::repositories::UserRepo;
use tdm_db::DbPool;

/// Create an active user with an Argon2id-hashed password.
pub async fn create_user(pool: &DbPool, username: &str, password: &str) -> anyhow::Result<User> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    validate_password_strength(password, MIN_PASSWORD_LENGTH).map_err(|msg| anyhow!(msg))?;
    let password_hash =
        hash_password(password).map_err(|e| anyhow!("Password hashing failed: {e}"))?;

    let input = CreateUser {
        username: username.to_string(),
        password_hash,
    };
    match UserRepo::create(pool, &input).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "Created user");
            Ok(user)
        }
        Err(e) if tdm_db::is_unique_violation(&e) => bail!("User '{username}' already exists"),
        Err(e) => Err(e.into()),
    }
}
