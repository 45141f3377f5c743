//! Process-wide authentication session state.
//!
//! `AuthSession` is the single owner of the persisted credentials
//! record. Every mutation goes through [`AuthSession::update`] or
//! [`AuthSession::reset_to_random_default_identity`], both of which
//! persist synchronously and notify observers before returning, so a
//! second update from another logical task is strictly ordered after.

use crate::error::{AuthError, AuthResult};
use auth_storage::{Credentials, CredentialVault, CredentialsUpdate};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Handle identifying a registered observer.
pub type SubscriptionId = u64;

/// Callback type for state-changed notifications.
pub type SessionObserver = Box<dyn Fn(&StateChangedPayload) + Send + Sync>;

/// Payload delivered to observers after every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangedPayload {
    /// Whether a session token is held.
    pub signed_in: bool,
    /// Current email, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Outstanding confirmation link, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_auth_link: Option<String>,
    /// Current default identity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// Process-wide state holder for the current identity.
///
/// Constructed once at process start via [`AuthSession::load`] and
/// passed by handle to every collaborator that needs it.
pub struct AuthSession {
    vault: CredentialVault,
    credentials: Mutex<Credentials>,
    identity: Mutex<Option<String>>,
    observers: Mutex<Vec<(SubscriptionId, SessionObserver)>>,
    next_subscription: AtomicU64,
}

impl AuthSession {
    /// Load persisted state and construct the session.
    pub fn load(vault: CredentialVault) -> AuthResult<Self> {
        let credentials = vault.load_credentials()?.unwrap_or_default();
        let identity = vault.load_default_identity()?;

        debug!(
            signed_in = credentials.is_signed_in(),
            has_pending_link = credentials.pending_auth_link.is_some(),
            "session state loaded"
        );

        Ok(Self {
            vault,
            credentials: Mutex::new(credentials),
            identity: Mutex::new(identity),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    /// Snapshot of the current credentials.
    pub fn credentials(&self) -> Credentials {
        self.credentials.lock().unwrap().clone()
    }

    /// True iff a session token is present.
    pub fn is_signed_in(&self) -> bool {
        self.credentials.lock().unwrap().is_signed_in()
    }

    /// Current email, if any.
    pub fn email(&self) -> Option<String> {
        self.credentials.lock().unwrap().email.clone()
    }

    /// Outstanding confirmation link, if any.
    pub fn pending_auth_link(&self) -> Option<String> {
        self.credentials.lock().unwrap().pending_auth_link.clone()
    }

    /// Current default identity, if any.
    pub fn identity(&self) -> Option<String> {
        self.identity.lock().unwrap().clone()
    }

    /// Register an observer for state-changed notifications.
    ///
    /// Observers are invoked synchronously, in registration order,
    /// before the mutating call returns.
    pub fn subscribe(&self, observer: SessionObserver) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().unwrap().push((id, observer));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock().unwrap();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    /// Merge a partial update into the stored credentials, persist, and
    /// notify observers.
    ///
    /// On a failed durable write the in-memory merge is NOT rolled back
    /// and observers are still notified: the update is logically
    /// applied, durability uncertain. The caller may retry the write by
    /// re-issuing the update.
    pub fn update(&self, update: CredentialsUpdate) -> AuthResult<()> {
        let snapshot = {
            let mut credentials = self.credentials.lock().unwrap();
            credentials.apply(&update);
            credentials.clone()
        };

        let persisted = self.vault.save_credentials(&snapshot);
        if let Err(e) = &persisted {
            warn!(error = %e, "credential write failed; in-memory state already advanced");
        }

        self.notify(&snapshot);
        persisted?;
        Ok(())
    }

    /// Assign a new randomly generated default identity, persist it,
    /// and notify observers.
    ///
    /// Used after sign-out so the user retains a usable anonymous
    /// identity. Same durability contract as [`AuthSession::update`].
    pub fn reset_to_random_default_identity(&self) -> AuthResult<String> {
        let identity = random_default_identity();

        {
            let mut slot = self.identity.lock().unwrap();
            *slot = Some(identity.clone());
        }

        let persisted = self.vault.save_default_identity(&identity);
        if let Err(e) = &persisted {
            warn!(error = %e, "identity write failed; in-memory state already advanced");
        }

        debug!(%identity, "default identity reset");
        self.notify(&self.credentials());
        persisted?;
        Ok(identity)
    }

    /// Notify all observers, in registration order.
    fn notify(&self, snapshot: &Credentials) {
        let payload = StateChangedPayload {
            signed_in: snapshot.is_signed_in(),
            email: snapshot.email.clone(),
            pending_auth_link: snapshot.pending_auth_link.clone(),
            identity: self.identity(),
        };

        let observers = self.observers.lock().unwrap();
        for (_, observer) in observers.iter() {
            observer(&payload);
        }
    }
}

/// Generate a fresh anonymous identity, e.g. `Guest-x7Kq2mPd`.
fn random_default_identity() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("Guest-{suffix}")
}
