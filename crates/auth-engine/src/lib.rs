//! Magic-link authentication core.
//!
//! This crate provides:
//! - `AuthSession`: process-wide identity state with a persistence
//!   boundary and synchronous observer notifications
//! - `AuthChannel`: the two-phase request/link/credentials protocol
//!   engine with bounded waits and close-on-drop channel cleanup
//! - Explicit FSM-based handshake state management
//! - Messaging-connection traits the transport collaborator implements

mod channel;
mod error;
mod handshake_fsm;
mod messaging;
mod session;

pub use channel::{AuthChannel, HandshakeConfig};
pub use error::{AuthError, AuthResult};
pub use handshake_fsm::handshake_machine;
pub use handshake_fsm::{
    AuthState, HandshakeMachine, HandshakeMachineInput, HandshakeMachineState,
};
pub use messaging::{
    JoinRejection, MessagingChannel, MessagingConnection, RemoteSessionError,
    SessionScopedChannel,
};
pub use session::{AuthSession, SessionObserver, StateChangedPayload, SubscriptionId};
