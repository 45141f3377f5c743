//! The persisted credentials record and its partial-merge type.

use serde::{Deserialize, Serialize};

/// The persisted identity record.
///
/// Invariants: a present `token` means the session is signed in; a
/// present `pending_auth_link` means a handshake is outstanding.
/// Receiving credentials clears the pending link, so the two are never
/// both meaningfully set in normal flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// Email the user authenticated (or is authenticating) with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Opaque, server-issued session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Confirmation link issued for an outstanding handshake
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_auth_link: Option<String>,
}

impl Credentials {
    /// True iff a session token is present.
    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Merge a partial update into this record.
    pub fn apply(&mut self, update: &CredentialsUpdate) {
        update.email.apply_to(&mut self.email);
        update.token.apply_to(&mut self.token);
        update.pending_auth_link.apply_to(&mut self.pending_auth_link);
    }
}

/// Per-field merge instruction for a partial credentials update.
///
/// Distinguishes "leave the field alone" from "clear it" — a plain
/// `Option` cannot express both.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldUpdate<T> {
    /// Leave the stored value unchanged
    #[default]
    Keep,
    /// Clear the stored value
    Clear,
    /// Replace the stored value
    Set(T),
}

impl<T: Clone> FieldUpdate<T> {
    fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *slot = None,
            FieldUpdate::Set(value) => *slot = Some(value.clone()),
        }
    }
}

/// A partial credentials update. Fields default to [`FieldUpdate::Keep`],
/// so an empty update merges nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialsUpdate {
    pub email: FieldUpdate<String>,
    pub token: FieldUpdate<String>,
    pub pending_auth_link: FieldUpdate<String>,
}

impl CredentialsUpdate {
    /// Record a freshly issued confirmation link.
    pub fn pending_link(link: impl Into<String>) -> Self {
        Self {
            pending_auth_link: FieldUpdate::Set(link.into()),
            ..Self::default()
        }
    }

    /// Record issued session credentials. Clears the pending link; an
    /// absent email leaves the stored one untouched.
    pub fn signed_in(email: Option<String>, token: impl Into<String>) -> Self {
        Self {
            email: match email {
                Some(email) => FieldUpdate::Set(email),
                None => FieldUpdate::Keep,
            },
            token: FieldUpdate::Set(token.into()),
            pending_auth_link: FieldUpdate::Clear,
        }
    }

    /// Clear the signed-in identity.
    pub fn signed_out() -> Self {
        Self {
            email: FieldUpdate::Clear,
            token: FieldUpdate::Clear,
            pending_auth_link: FieldUpdate::Keep,
        }
    }

    /// True if no field would change.
    pub fn is_empty(&self) -> bool {
        self.email == FieldUpdate::Keep
            && self.token == FieldUpdate::Keep
            && self.pending_auth_link == FieldUpdate::Keep
    }
}
