//! Handshake state machine using rust-fsm.
//!
//! This module defines an explicit finite state machine for the
//! two-phase authentication handshake, replacing implicit state
//! derivation from whichever channels happen to be open.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial; TokenLoaded on startup skips to SignedIn)
//! └────────┬────────┘
//!          │ StartRequested              VerifyRequested
//!          ▼                                   │
//! ┌─────────────────┐                          │
//! │  AwaitingLink   │ ── LinkIssued ──┐        │
//! └────────┬────────┘                 ▼        ▼
//!          │ HandshakeFailed   ┌──────────────────────┐
//!          ▼                   │  AwaitingCredentials │
//!        Idle                  └─────────┬────────────┘
//!                                        │ CredentialsIssued
//!                                        ▼
//!                              ┌─────────────────┐
//!                              │    SignedIn     │
//!                              └────────┬────────┘
//!                                       │ SignOutRequested
//!                                       ▼
//!                              ┌─────────────────┐
//!                              │   SigningOut    │ ── SignOutComplete ──► Idle
//!                              └─────────────────┘
//! ```
//!
//! `StartRequested` is accepted from every in-flight state: a second
//! call abandons the outstanding handshake and restarts (the default
//! tie-break policy). The machine is never persisted; a process restart
//! begins at `Idle`, or at `SignedIn` when a stored token was loaded.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro.
// This generates a module `handshake_machine` with:
// - handshake_machine::State (enum)
// - handshake_machine::Input (enum)
// - handshake_machine::StateMachine (type alias)
// - handshake_machine::Impl (trait impl)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub handshake_machine(Idle)

    Idle => {
        StartRequested => AwaitingLink,
        VerifyRequested => AwaitingCredentials,
        TokenLoaded => SignedIn,
        SignOutRequested => SigningOut
    },
    AwaitingLink => {
        LinkIssued => AwaitingCredentials,
        HandshakeFailed => Idle,
        // abandon-and-restart: a fresh negotiation channel replaces the
        // outstanding one
        StartRequested => AwaitingLink,
        VerifyRequested => AwaitingCredentials,
        SignOutRequested => SigningOut
    },
    AwaitingCredentials => {
        CredentialsIssued => SignedIn,
        HandshakeFailed => Idle,
        VerifyRequested => AwaitingCredentials,
        StartRequested => AwaitingLink,
        SignOutRequested => SigningOut
    },
    SignedIn => {
        StartRequested => AwaitingLink,
        VerifyRequested => AwaitingCredentials,
        SignOutRequested => SigningOut
    },
    SigningOut => {
        SignOutComplete => Idle
    }
}

// Re-export the generated types with clearer names
pub use handshake_machine::Input as HandshakeMachineInput;
pub use handshake_machine::State as HandshakeMachineState;
pub use handshake_machine::StateMachine as HandshakeMachine;

/// User-friendly handshake state for external consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No handshake outstanding, no session token.
    Idle,
    /// Negotiation channel open, request sent, waiting for the link.
    AwaitingLink,
    /// Link issued, waiting for the user to confirm it.
    AwaitingCredentials,
    /// A session token is held.
    SignedIn,
    /// Sign-out in progress.
    SigningOut,
}

impl AuthState {
    /// Returns true if a session token is held.
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn)
    }

    /// Returns true while a handshake is outstanding.
    pub fn is_handshake_in_flight(&self) -> bool {
        matches!(self, AuthState::AwaitingLink | AuthState::AwaitingCredentials)
    }
}

impl From<&HandshakeMachineState> for AuthState {
    fn from(state: &HandshakeMachineState) -> Self {
        match state {
            HandshakeMachineState::Idle => AuthState::Idle,
            HandshakeMachineState::AwaitingLink => AuthState::AwaitingLink,
            HandshakeMachineState::AwaitingCredentials => AuthState::AwaitingCredentials,
            HandshakeMachineState::SignedIn => AuthState::SignedIn,
            HandshakeMachineState::SigningOut => AuthState::SigningOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle() {
        let machine = HandshakeMachine::new();
        assert_eq!(*machine.state(), HandshakeMachineState::Idle);
    }

    #[test]
    fn full_handshake_flow() {
        let mut machine = HandshakeMachine::new();

        machine
            .consume(&HandshakeMachineInput::StartRequested)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::AwaitingLink);

        machine.consume(&HandshakeMachineInput::LinkIssued).unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::AwaitingCredentials);

        machine
            .consume(&HandshakeMachineInput::CredentialsIssued)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::SignedIn);
    }

    #[test]
    fn join_failure_returns_to_idle() {
        let mut machine = HandshakeMachine::new();

        machine
            .consume(&HandshakeMachineInput::StartRequested)
            .unwrap();
        machine
            .consume(&HandshakeMachineInput::HandshakeFailed)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::Idle);
    }

    #[test]
    fn verification_can_start_fresh_from_idle() {
        // A fresh page load re-enters via the activated link with no
        // negotiation phase in this process.
        let mut machine = HandshakeMachine::new();

        machine
            .consume(&HandshakeMachineInput::VerifyRequested)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::AwaitingCredentials);

        machine
            .consume(&HandshakeMachineInput::CredentialsIssued)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::SignedIn);
    }

    #[test]
    fn restart_abandons_outstanding_handshake() {
        let mut machine = HandshakeMachine::new();

        machine
            .consume(&HandshakeMachineInput::StartRequested)
            .unwrap();
        machine
            .consume(&HandshakeMachineInput::StartRequested)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::AwaitingLink);

        machine.consume(&HandshakeMachineInput::LinkIssued).unwrap();
        machine
            .consume(&HandshakeMachineInput::StartRequested)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::AwaitingLink);
    }

    #[test]
    fn token_loaded_skips_to_signed_in() {
        let mut machine = HandshakeMachine::new();

        machine.consume(&HandshakeMachineInput::TokenLoaded).unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::SignedIn);
    }

    #[test]
    fn sign_out_flow() {
        let mut machine = HandshakeMachine::new();

        machine.consume(&HandshakeMachineInput::TokenLoaded).unwrap();
        machine
            .consume(&HandshakeMachineInput::SignOutRequested)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::SigningOut);

        machine
            .consume(&HandshakeMachineInput::SignOutComplete)
            .unwrap();
        assert_eq!(*machine.state(), HandshakeMachineState::Idle);
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut machine = HandshakeMachine::new();

        // Can't claim a link was issued before requesting one
        assert!(machine.consume(&HandshakeMachineInput::LinkIssued).is_err());

        // Can't claim credentials from idle
        assert!(machine
            .consume(&HandshakeMachineInput::CredentialsIssued)
            .is_err());
    }

    #[test]
    fn auth_state_helpers() {
        assert!(AuthState::SignedIn.is_signed_in());
        assert!(!AuthState::Idle.is_signed_in());

        assert!(AuthState::AwaitingLink.is_handshake_in_flight());
        assert!(AuthState::AwaitingCredentials.is_handshake_in_flight());
        assert!(!AuthState::Idle.is_handshake_in_flight());
        assert!(!AuthState::SignedIn.is_handshake_in_flight());
        assert!(!AuthState::SigningOut.is_handshake_in_flight());
    }

    #[test]
    fn auth_state_conversion() {
        assert_eq!(AuthState::from(&HandshakeMachineState::Idle), AuthState::Idle);
        assert_eq!(
            AuthState::from(&HandshakeMachineState::AwaitingLink),
            AuthState::AwaitingLink
        );
        assert_eq!(
            AuthState::from(&HandshakeMachineState::AwaitingCredentials),
            AuthState::AwaitingCredentials
        );
        assert_eq!(
            AuthState::from(&HandshakeMachineState::SignedIn),
            AuthState::SignedIn
        );
        assert_eq!(
            AuthState::from(&HandshakeMachineState::SigningOut),
            AuthState::SigningOut
        );
    }
}
