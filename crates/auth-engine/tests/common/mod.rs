//! Shared test doubles: a scripted in-memory messaging transport, a
//! recording session-scoped collaborator, and an in-memory store.
#![allow(dead_code)]

use auth_engine::{
    AuthSession, JoinRejection, MessagingChannel, MessagingConnection, RemoteSessionError,
    SessionScopedChannel,
};
use auth_storage::{CredentialVault, KeyValueStore, StoreResult};
use auth_wire::{ClientMessage, ServerEvent};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// How a scripted channel answers its join.
pub enum JoinBehavior {
    Accept,
    Reject(&'static str),
    Hang,
}

/// Script for a single channel: join behavior plus the events delivered
/// once the client pushes its first message.
pub struct ChannelScript {
    pub join: JoinBehavior,
    pub events_after_push: Vec<ServerEvent>,
}

impl ChannelScript {
    pub fn accepting(events_after_push: Vec<ServerEvent>) -> Self {
        Self {
            join: JoinBehavior::Accept,
            events_after_push,
        }
    }
}

/// Everything the fake transport observed.
#[derive(Default)]
pub struct ConnectionLog {
    pub opened_topics: Mutex<Vec<String>>,
    pub joins: AtomicUsize,
    pub pushes: Mutex<Vec<ClientMessage>>,
    pub leaves: AtomicUsize,
}

/// Scripted in-memory messaging connection. Each `open` consumes the
/// next script; channels beyond the script list accept and stay silent.
pub struct FakeConnection {
    scripts: Mutex<Vec<ChannelScript>>,
    pub log: Arc<ConnectionLog>,
}

impl FakeConnection {
    pub fn new(scripts: Vec<ChannelScript>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            log: Arc::new(ConnectionLog::default()),
        })
    }
}

impl MessagingConnection for FakeConnection {
    fn open(&self, topic: &str) -> Box<dyn MessagingChannel> {
        self.log
            .opened_topics
            .lock()
            .unwrap()
            .push(topic.to_string());

        let mut scripts = self.scripts.lock().unwrap();
        let script = if scripts.is_empty() {
            ChannelScript::accepting(Vec::new())
        } else {
            scripts.remove(0)
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Box::new(FakeChannel {
            script,
            log: self.log.clone(),
            events_tx,
            events_rx: Some(events_rx),
        })
    }
}

struct FakeChannel {
    script: ChannelScript,
    log: Arc<ConnectionLog>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ServerEvent>>,
}

impl MessagingChannel for FakeChannel {
    fn join(&mut self) -> BoxFuture<'_, Result<(), JoinRejection>> {
        self.log.joins.fetch_add(1, Ordering::SeqCst);
        match &self.script.join {
            JoinBehavior::Accept => Box::pin(async { Ok(()) }),
            JoinBehavior::Reject(reason) => {
                let reason = *reason;
                Box::pin(async move { Err(JoinRejection::new(reason)) })
            }
            JoinBehavior::Hang => Box::pin(std::future::pending()),
        }
    }

    fn push(&mut self, message: ClientMessage) {
        self.log.pushes.lock().unwrap().push(message);
        for event in self.script.events_after_push.drain(..) {
            let _ = self.events_tx.send(event);
        }
    }

    fn events(&mut self) -> mpsc::UnboundedReceiver<ServerEvent> {
        self.events_rx.take().expect("events() called once")
    }

    fn leave(&mut self) {
        self.log.leaves.fetch_add(1, Ordering::SeqCst);
    }
}

/// Recording session-scoped collaborator.
#[derive(Default)]
pub struct FakeRemote {
    pub fail_sign_in: bool,
    pub fail_sign_out: bool,
    pub sign_in_tokens: Mutex<Vec<String>>,
    pub sign_outs: AtomicUsize,
}

impl FakeRemote {
    pub fn failing_sign_out() -> Self {
        Self {
            fail_sign_out: true,
            ..Self::default()
        }
    }
}

impl SessionScopedChannel for FakeRemote {
    fn sign_in(&self, token: &str) -> BoxFuture<'_, Result<(), RemoteSessionError>> {
        self.sign_in_tokens.lock().unwrap().push(token.to_string());
        let fail = self.fail_sign_in;
        Box::pin(async move {
            if fail {
                Err(RemoteSessionError::new("remote sign-in refused"))
            } else {
                Ok(())
            }
        })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), RemoteSessionError>> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_sign_out;
        Box::pin(async move {
            if fail {
                Err(RemoteSessionError::new("remote sign-out refused"))
            } else {
                Ok(())
            }
        })
    }
}

/// In-memory storage. Cloning shares the backing map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }
}

/// Fresh session over an in-memory store.
pub fn memory_session() -> Arc<AuthSession> {
    Arc::new(AuthSession::load(CredentialVault::new(Box::new(MemoryStore::new()))).unwrap())
}

/// Fresh session over the given store.
pub fn session_over(store: MemoryStore) -> Arc<AuthSession> {
    Arc::new(AuthSession::load(CredentialVault::new(Box::new(store))).unwrap())
}
