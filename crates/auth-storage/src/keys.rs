//! Storage key constants.

/// Storage keys used by the auth core
pub struct StorageKeys;

impl StorageKeys {
    /// Persisted credentials record (JSON)
    pub const CREDENTIALS: &'static str = "credentials";

    /// Randomized default identity assigned after sign-out
    pub const DEFAULT_IDENTITY: &'static str = "default_identity";
}
