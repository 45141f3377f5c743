//! Pure wire types for the magic-link authentication protocol.
//!
//! This crate contains only data types and serialization — no I/O, no
//! async, no transport. It defines the shared language between the
//! client core and the authentication server: the messages a client
//! pushes on an auth channel, the events the server delivers back, and
//! the topic names the channels are addressed by.
//!
//! Every payload has a fixed field set and is validated by serde at the
//! channel boundary; there are no free-form event maps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic prefix shared by all auth channels.
pub const AUTH_TOPIC_PREFIX: &str = "auth:";

/// Messages pushed by the client on an auth channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask the server to issue a confirmation link for `email`.
    ///
    /// `origin` tags which client surface made the request so the server
    /// can shape the confirmation page accordingly.
    AuthRequest { email: String, origin: String },

    /// Present an activated link's embedded token back to the server in
    /// exchange for session credentials.
    AuthVerified {
        token: String,
        payload: serde_json::Value,
    },
}

/// Events delivered by the server on an auth channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A confirmation link was issued for the pending request.
    AuthLink { link: String },

    /// Session credentials, issued once the link was verified.
    ///
    /// `credentials` is the opaque session token; it is server-issued
    /// and trusted as delivered.
    AuthCredentials {
        credentials: String,
        payload: CredentialsPayload,
    },

    /// The server refused the exchange.
    Error { reason: Option<String> },
}

/// Identity details accompanying issued credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsPayload {
    #[serde(default)]
    pub email: Option<String>,
}

/// Build a fresh, uniquely-named negotiation topic.
///
/// Negotiation channels are short-lived and never reused, so every call
/// produces a new random topic.
pub fn negotiation_topic() -> String {
    format!("{AUTH_TOPIC_PREFIX}{}", Uuid::new_v4())
}

/// True if `topic` addresses an auth channel.
pub fn is_auth_topic(topic: &str) -> bool {
    topic.starts_with(AUTH_TOPIC_PREFIX)
}
