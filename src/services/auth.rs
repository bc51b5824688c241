use crate::error::{AppError, Result};
use crate::models::user::{Identity, NewUser, Role, User};
use crate::repositories::user::IdentityStore;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 2;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| AppError::Internal(format!("Failed to generate salt: {}", e)))?;

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Registration data that passed validation.
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Creates a new rider account.
///
/// A taken email surfaces as the store's unique-violation error.
pub async fn register(store: &dyn IdentityStore, registration: Registration) -> Result<Identity> {
    tracing::debug!("🔐 Creating user: {}", registration.email);
    let Registration {
        email,
        mut password,
        first_name,
        last_name,
        phone,
    } = registration;

    let password_hash = hash_password(&password)?;
    password.zeroize();

    let identity = store
        .create(NewUser {
            email: email.trim().to_ascii_lowercase(),
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            phone,
            role: Role::Rider,
        })
        .await?;

    tracing::info!("✅ User created with ID: {}", identity.id);
    Ok(identity)
}

/// Authenticates a user by email and password.
pub async fn authenticate_user(
    store: &dyn IdentityStore,
    email: &str,
    password: &str,
) -> Result<User> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = store
        .find_by_email(email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::AccountDisabled(user.id));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}

/// Changes a user's password after checking the current one.
pub async fn change_password(
    store: &dyn IdentityStore,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<Identity> {
    tracing::info!("🔑 Changing password for user: {}", user_id);

    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UnknownSubject(user_id))?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(AppError::status(
            axum::http::StatusCode::UNAUTHORIZED,
            "Current password is incorrect",
        ));
    }

    let new_hash = hash_password(new_password)?;
    store.update_password(user_id, &new_hash).await?;

    tracing::info!("✅ Password changed for user: {}", user_id);
    Ok(user.into())
}
