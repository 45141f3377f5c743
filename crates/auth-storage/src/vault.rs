//! High-level API for the persisted auth records.

use crate::{Credentials, KeyValueStore, StorageKeys, StoreError, StoreResult};

/// High-level API for storing and retrieving the auth records over any
/// [`KeyValueStore`] backend.
pub struct CredentialVault {
    storage: Box<dyn KeyValueStore>,
}

impl CredentialVault {
    /// Create a new vault with the given storage backend
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Load the persisted credentials record, if any.
    pub fn load_credentials(&self) -> StoreResult<Option<Credentials>> {
        match self.storage.get(StorageKeys::CREDENTIALS)? {
            Some(raw) => {
                let creds = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Encoding(format!("corrupt credentials: {e}")))?;
                Ok(Some(creds))
            }
            None => Ok(None),
        }
    }

    /// Persist the credentials record.
    pub fn save_credentials(&self, credentials: &Credentials) -> StoreResult<()> {
        let raw = serde_json::to_string(credentials)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::CREDENTIALS, &raw)
    }

    /// Delete the persisted credentials record.
    pub fn clear_credentials(&self) -> StoreResult<()> {
        self.storage.delete(StorageKeys::CREDENTIALS)?;
        Ok(())
    }

    /// Load the persisted default identity, if any.
    pub fn load_default_identity(&self) -> StoreResult<Option<String>> {
        self.storage.get(StorageKeys::DEFAULT_IDENTITY)
    }

    /// Persist the default identity.
    pub fn save_default_identity(&self, identity: &str) -> StoreResult<()> {
        self.storage.set(StorageKeys::DEFAULT_IDENTITY, identity)
    }
}
