use actix_web::web;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{AppError, AppResult};

/// Hashing runs on the blocking pool so it never stalls a worker.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    web::block(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
    })
    .await
    .map_err(|err| {
        log::error!("password hashing failed: {}", err);
        AppError::Internal("Internal server error".into())
    })
}

pub async fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hashed = hashed.to_owned();
    web::block(move || match PasswordHash::new(&hashed) {
        Ok(parsed) => Ok::<_, ()>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        ),
        Err(_) => Ok(false),
    })
    .await
    .map_err(|_| AppError::Internal("Internal server error".into()))
}
