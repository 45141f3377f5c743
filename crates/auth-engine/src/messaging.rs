//! Collaborator-facing messaging traits.
//!
//! The protocol engine depends on a minimal channel shape — open a
//! topic-addressed channel, join it, push messages, receive events,
//! leave — not on any specific transport. The transport collaborator
//! (websocket client, broker client, in-memory fake in tests)
//! implements these traits.

use auth_wire::{ClientMessage, ServerEvent};
use futures_util::future::BoxFuture;
use std::fmt;
use tokio::sync::mpsc;

/// Reason a channel join was refused by the server or transport.
#[derive(Debug, Clone)]
pub struct JoinRejection {
    pub reason: String,
}

impl JoinRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for JoinRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "join rejected: {}", self.reason)
    }
}

/// Failure reported by the session-scoped collaborator.
#[derive(Debug, Clone)]
pub struct RemoteSessionError {
    pub reason: String,
}

impl RemoteSessionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RemoteSessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote session error: {}", self.reason)
    }
}

/// A messaging connection capable of opening topic-addressed channels.
pub trait MessagingConnection: Send + Sync {
    /// Open (but do not join) a channel addressed by `topic`.
    fn open(&self, topic: &str) -> Box<dyn MessagingChannel>;
}

/// A single logical channel on a messaging connection.
///
/// Channels are short-lived: the engine joins, exchanges at most a
/// handful of messages, and leaves. They are never reused.
pub trait MessagingChannel: Send {
    /// Join the channel. Completes once the server accepts or refuses
    /// the subscription.
    fn join(&mut self) -> BoxFuture<'_, Result<(), JoinRejection>>;

    /// Push a message to the server. Fire-and-forget; delivery failures
    /// surface as a missing reply, not an error here.
    fn push(&mut self, message: ClientMessage);

    /// Take the inbound event stream. Each server event is delivered
    /// exactly once. May be called at most once per channel.
    fn events(&mut self) -> mpsc::UnboundedReceiver<ServerEvent>;

    /// Leave the channel and release the server-side subscription.
    fn leave(&mut self);
}

/// An already-established, session-scoped channel that must be told
/// about sign-in and sign-out transitions (e.g. the room connection a
/// signed-in user is currently in).
pub trait SessionScopedChannel: Send + Sync {
    /// Announce the freshly issued session token.
    fn sign_in(&self, token: &str) -> BoxFuture<'_, Result<(), RemoteSessionError>>;

    /// Ask the server to invalidate the session token.
    fn sign_out(&self) -> BoxFuture<'_, Result<(), RemoteSessionError>>;
}
