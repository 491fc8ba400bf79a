// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures raised by the ledger model and the persistence mapper.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid date '{value}' in column {column}, expected YYYY-MM-DD")]
    InvalidDate { column: &'static str, value: String },

    #[error("invalid amount '{value}' in column {column}")]
    InvalidAmount { column: &'static str, value: String },

    #[error("unknown account type tag {0}")]
    UnknownAccountType(i64),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("amount out of range: {0} overflowed")]
    Overflow(&'static str),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
