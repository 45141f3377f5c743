//! Two-phase authentication handshake engine.
//!
//! `AuthChannel` owns the protocol: it opens a transient negotiation
//! channel to request a confirmation link, and later exchanges the
//! activated link's token for session credentials over a verification
//! channel. Mutating [`AuthSession`] is the only side effect of
//! protocol progress.
//!
//! Every suspension point (join, await link, await credentials) is
//! bounded by a deadline from [`HandshakeConfig`], and every opened
//! channel is wrapped in a close-on-drop guard so an abandoned
//! handshake future cannot leak a server-side subscription.

use crate::error::{AuthError, AuthResult};
use crate::handshake_fsm::{AuthState, HandshakeMachine, HandshakeMachineInput};
use crate::messaging::{MessagingChannel, MessagingConnection, SessionScopedChannel};
use crate::session::AuthSession;
use auth_storage::CredentialsUpdate;
use auth_wire::{negotiation_topic, ClientMessage, ServerEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for handshake deadlines and the single-flight policy.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Deadline for a channel join to be accepted.
    pub join_timeout: Duration,
    /// Deadline for the server to deliver the awaited event. Generous,
    /// because the link event only arrives after the server has
    /// dispatched an email.
    pub event_timeout: Duration,
    /// Origin tag sent with every auth request.
    pub origin: String,
    /// Reject a second handshake with `HandshakeInProgress` instead of
    /// abandoning the first (the default abandons and restarts).
    pub strict_single_flight: bool,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
            event_timeout: Duration::from_secs(120),
            origin: "web".to_string(),
            strict_single_flight: false,
        }
    }
}

/// The protocol engine driving the email → link → credentials handshake.
///
/// One handshake is intended in flight at a time. A second
/// `start_authentication` while one is outstanding abandons it and
/// restarts with a fresh channel — surprising, but it matches how the
/// flow behaves when a user re-submits the form; the abandonment is
/// logged at warn. Set [`HandshakeConfig::strict_single_flight`] to get
/// a rejection instead.
pub struct AuthChannel {
    connection: Arc<dyn MessagingConnection>,
    session: Arc<AuthSession>,
    fsm: Mutex<HandshakeMachine>,
    config: HandshakeConfig,
}

impl AuthChannel {
    /// Create a new engine over `connection`, mutating `session`.
    ///
    /// If the session loaded a persisted token, the state machine
    /// starts at `signed_in` instead of `idle`. A persisted pending
    /// link never resumes `awaiting_credentials`: the verification
    /// channel is keyed by the token embedded in the activated link,
    /// which only the collaborator can supply.
    pub fn new(connection: Arc<dyn MessagingConnection>, session: Arc<AuthSession>) -> Self {
        Self::with_config(connection, session, HandshakeConfig::default())
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(
        connection: Arc<dyn MessagingConnection>,
        session: Arc<AuthSession>,
        config: HandshakeConfig,
    ) -> Self {
        let mut fsm = HandshakeMachine::new();
        if session.is_signed_in() {
            let _ = fsm.consume(&HandshakeMachineInput::TokenLoaded);
        }

        Self {
            connection,
            session,
            fsm: Mutex::new(fsm),
            config,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> AuthState {
        let fsm = self.fsm.lock().unwrap();
        AuthState::from(fsm.state())
    }

    /// True iff the session holds a token.
    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    /// Current email, if any.
    pub fn email(&self) -> Option<String> {
        self.session.email()
    }

    /// Outstanding confirmation link, if any.
    pub fn pending_auth_link(&self) -> Option<String> {
        self.session.pending_auth_link()
    }

    /// Request a confirmation link for `email`.
    ///
    /// Opens a fresh, uniquely-named negotiation channel, sends the
    /// request, and waits for the single link event. The link is
    /// persisted into the session before this resolves with it. The
    /// channel is closed whether the handshake succeeds, fails, or the
    /// returned future is dropped.
    ///
    /// No automatic retry: on `ChannelJoin` or `HandshakeTimeout` the
    /// caller re-invokes, and each retry opens a brand-new channel.
    pub async fn start_authentication(&self, email: &str) -> AuthResult<String> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }

        let state = self.state();
        if state.is_handshake_in_flight() {
            if self.config.strict_single_flight {
                return Err(AuthError::HandshakeInProgress);
            }
            warn!(
                ?state,
                "abandoning in-flight handshake; opening a fresh negotiation channel"
            );
        }
        self.transition(&HandshakeMachineInput::StartRequested)?;

        let topic = negotiation_topic();
        debug!(%topic, "opening negotiation channel");
        let mut guard = ChannelGuard::new(self.connection.open(&topic));

        if let Err(e) = self.join_bounded(&mut guard).await {
            let _ = self.transition(&HandshakeMachineInput::HandshakeFailed);
            return Err(e);
        }

        let mut events = guard.channel.events();
        guard.channel.push(ClientMessage::AuthRequest {
            email: email.to_string(),
            origin: self.config.origin.clone(),
        });

        let link = match self.await_link(&mut events).await {
            Ok(link) => link,
            Err(e) => {
                let _ = self.transition(&HandshakeMachineInput::HandshakeFailed);
                return Err(e);
            }
        };

        // Persist first, then advance: a failed write still leaves the
        // link applied in memory and is surfaced after cleanup.
        let persisted = self.session.update(CredentialsUpdate::pending_link(link.clone()));
        self.transition(&HandshakeMachineInput::LinkIssued)?;
        guard.close();

        info!("confirmation link issued");
        persisted?;
        Ok(link)
    }

    /// Exchange an activated link's token for session credentials.
    ///
    /// Called by a collaborator once the user visits the confirmation
    /// link; the collaborator extracts `topic`, `token` and `payload`
    /// from the link. On success the credentials are persisted, the
    /// pending link is cleared, and the optional session-scoped
    /// collaborator is told to sign in (best-effort).
    pub async fn verify_authentication(
        &self,
        topic: &str,
        token: &str,
        payload: serde_json::Value,
        remote: Option<&dyn SessionScopedChannel>,
    ) -> AuthResult<()> {
        self.transition(&HandshakeMachineInput::VerifyRequested)?;

        debug!(%topic, "opening verification channel");
        let mut guard = ChannelGuard::new(self.connection.open(topic));

        if let Err(e) = self.join_bounded(&mut guard).await {
            let _ = self.transition(&HandshakeMachineInput::HandshakeFailed);
            return Err(e);
        }

        let mut events = guard.channel.events();
        guard.channel.push(ClientMessage::AuthVerified {
            token: token.to_string(),
            payload,
        });

        let (session_token, email) = match self.await_credentials(&mut events).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = self.transition(&HandshakeMachineInput::HandshakeFailed);
                return Err(e);
            }
        };

        let persisted = self
            .session
            .update(CredentialsUpdate::signed_in(email, session_token.clone()));
        self.transition(&HandshakeMachineInput::CredentialsIssued)?;
        guard.close();

        if let Some(remote) = remote {
            if let Err(e) = remote.sign_in(&session_token).await {
                warn!(error = %e, "remote session sign-in failed; continuing with local session");
            }
        }

        info!("signed in");
        persisted?;
        Ok(())
    }

    /// Sign out, locally first.
    ///
    /// The optional session-scoped collaborator is told first, while
    /// the token is still known server-side, but its failure never
    /// blocks local clearing: it is logged and the local session is
    /// cleared regardless. A fresh random default identity is assigned
    /// so the user keeps a usable anonymous identity.
    pub async fn sign_out(&self, remote: Option<&dyn SessionScopedChannel>) -> AuthResult<()> {
        let _ = self.transition(&HandshakeMachineInput::SignOutRequested);

        if let Some(remote) = remote {
            if let Err(e) = remote.sign_out().await {
                warn!(error = %e, "remote sign-out failed; clearing local session anyway");
            }
        }

        let cleared = self.session.update(CredentialsUpdate::signed_out());
        let reset = self.session.reset_to_random_default_identity();
        let _ = self.transition(&HandshakeMachineInput::SignOutComplete);

        info!("signed out");
        cleared?;
        reset?;
        Ok(())
    }

    /// Transition the FSM, logging state changes.
    fn transition(&self, input: &HandshakeMachineInput) -> AuthResult<AuthState> {
        let mut fsm = self.fsm.lock().unwrap();
        let old_state = AuthState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = AuthState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(?old_state, ?new_state, "handshake state transition");
        }

        Ok(new_state)
    }

    /// Join a channel within the configured deadline.
    async fn join_bounded(&self, guard: &mut ChannelGuard) -> AuthResult<()> {
        match timeout(self.config.join_timeout, guard.channel.join()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(rejection)) => Err(AuthError::ChannelJoin(rejection.reason)),
            Err(_) => Err(AuthError::HandshakeTimeout),
        }
    }

    /// Wait for the single link event on a negotiation channel.
    async fn await_link(
        &self,
        events: &mut mpsc::UnboundedReceiver<ServerEvent>,
    ) -> AuthResult<String> {
        match self.next_event(events).await? {
            ServerEvent::AuthLink { link } => {
                url::Url::parse(&link)
                    .map_err(|e| AuthError::ProtocolViolation(format!("malformed auth link: {e}")))?;
                Ok(link)
            }
            // An error during negotiation is a channel failure, not a
            // verification verdict: the caller retries by re-invoking.
            ServerEvent::Error { reason } => Err(AuthError::ChannelJoin(
                reason.unwrap_or_else(|| "negotiation refused".to_string()),
            )),
            other => Err(AuthError::ProtocolViolation(format!(
                "expected auth_link, got {other:?}"
            ))),
        }
    }

    /// Wait for the single credentials event on a verification channel.
    async fn await_credentials(
        &self,
        events: &mut mpsc::UnboundedReceiver<ServerEvent>,
    ) -> AuthResult<(String, Option<String>)> {
        match self.next_event(events).await? {
            ServerEvent::AuthCredentials {
                credentials,
                payload,
            } => Ok((credentials, payload.email)),
            ServerEvent::Error { reason } => Err(AuthError::VerificationRejected(
                reason.unwrap_or_else(|| "verification refused".to_string()),
            )),
            other => Err(AuthError::ProtocolViolation(format!(
                "expected auth_credentials, got {other:?}"
            ))),
        }
    }

    async fn next_event(
        &self,
        events: &mut mpsc::UnboundedReceiver<ServerEvent>,
    ) -> AuthResult<ServerEvent> {
        match timeout(self.config.event_timeout, events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(AuthError::ChannelClosed),
            Err(_) => Err(AuthError::HandshakeTimeout),
        }
    }
}

/// Leaves the wrapped channel when dropped, so a cancelled handshake
/// future does not leak a server-side subscription.
struct ChannelGuard {
    channel: Box<dyn MessagingChannel>,
    closed: bool,
}

impl ChannelGuard {
    fn new(channel: Box<dyn MessagingChannel>) -> Self {
        Self {
            channel,
            closed: false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.channel.leave();
            self.closed = true;
        }
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.close();
    }
}
