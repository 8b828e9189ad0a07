// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admin credential verification.
//!
//! The login handler only sees the [`CredentialStore`] trait. The bundled
//! implementation checks against a single admin account whose password is
//! stored as an Argon2 PHC string.

use crate::config::AdminConfig;
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};

/// Source of truth for admin credentials.
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(true)` when the username and password match.
    fn verify(&self, username: &str, password: &str) -> Result<bool>;
}

/// Single admin account backed by an Argon2 password hash.
pub struct Argon2Credentials {
    username: String,
    password_hash: String,
}

impl Argon2Credentials {
    /// Build from a username and PHC string, rejecting malformed hashes.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash)
            .map_err(|e| AppError::Config(format!("invalid admin password hash: {}", e)))?;

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// Build from configuration. The password hash is required.
    pub fn from_config(config: &AdminConfig) -> Result<Self> {
        let hash = config
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Config("ADMIN_PASSWORD_HASH is not set".to_string()))?;
        Self::new(config.username.clone(), hash)
    }
}

impl CredentialStore for Argon2Credentials {
    /// The password hash is checked even when the username is wrong, so both
    /// failures take the same time.
    fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Credentials(e.to_string()))?;

        let password_ok = match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => return Err(AppError::Credentials(e.to_string())),
        };
        let username_ok = username == self.username;

        Ok(username_ok && password_ok)
    }
}
