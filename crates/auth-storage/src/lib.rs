//! Durable credential storage for the auth client core.
//!
//! This crate provides the persistence boundary the session state sits
//! behind:
//! - a [`KeyValueStore`] trait for durable string storage
//! - a JSON file-backed default implementation ([`FileStore`])
//! - the persisted [`Credentials`] record and its partial-merge type
//! - a high-level [`CredentialVault`] API over a boxed store

mod credentials;
mod file;
mod keys;
mod traits;
mod vault;

pub use credentials::{Credentials, CredentialsUpdate, FieldUpdate};
pub use file::FileStore;
pub use keys::StorageKeys;
pub use traits::KeyValueStore;
pub use vault::CredentialVault;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store failure
    #[error("Store error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Create the default file-backed store under the platform data
/// directory, namespaced by `app_name`.
pub fn create_store(app_name: &str) -> StoreResult<Box<dyn KeyValueStore>> {
    let store = FileStore::in_data_dir(app_name)?;
    Ok(Box::new(store))
}
