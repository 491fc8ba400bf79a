// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::error::{Result, StoreError};

/// Outcome of checking a password against the stored `users.password` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    /// The stored value is a plaintext password that matched. It should be
    /// rehashed right away.
    LegacyMatch,
    Mismatch,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored: &str) -> Verdict {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
            {
                Verdict::Match
            } else {
                Verdict::Mismatch
            }
        }
        // Not a PHC string: rows written before hashing was introduced.
        Err(_) if stored == password => Verdict::LegacyMatch,
        Err(_) => Verdict::Mismatch,
    }
}
