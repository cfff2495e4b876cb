//! Device session gate.
//!
//! This is not a protocol state machine; the backend owns the real link.
//! The session only tracks:
//! - whether the panel believes a device is connected,
//! - which actions are in flight (one of each kind at a time),
//! - a cancellation scope, so results that arrive after a disconnect or
//!   shutdown are dropped instead of applied.
//!
//! ## Rust concepts
//! - `AtomicBool` for flags shared across async tasks without a lock
//! - RAII guards: dropping an [`ActionGuard`] releases its busy flag on every
//!   exit path, including `?` and cancellation
//! - `tokio_util::sync::CancellationToken` trees: child tokens are cancelled
//!   with their parent

use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// User-triggered backend actions. Each has its own busy flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scan,
    Connect,
    Disconnect,
    Upload,
    FetchUrl,
    Text,
    SyncTime,
    ClockMode,
    Search,
}

const ACTION_COUNT: usize = 9;

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::Scan,
        Action::Connect,
        Action::Disconnect,
        Action::Upload,
        Action::FetchUrl,
        Action::Text,
        Action::SyncTime,
        Action::ClockMode,
        Action::Search,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Actions that push something to the display need a connected device.
    pub fn requires_device(self) -> bool {
        matches!(
            self,
            Action::Upload | Action::FetchUrl | Action::Text | Action::SyncTime | Action::ClockMode
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no device connected")]
    NotConnected,

    #[error("{0:?} is already in progress")]
    Busy(Action),

    #[error("cancelled: the session ended before the result arrived")]
    Cancelled,
}

pub struct DeviceSession {
    connected: AtomicBool,
    busy: [AtomicBool; ACTION_COUNT],
    root: CancellationToken,
    scope: Mutex<CancellationToken>,
}

impl DeviceSession {
    pub fn new() -> Self {
        let root = CancellationToken::new();
        let scope = Mutex::new(root.child_token());
        Self {
            connected: AtomicBool::new(false),
            busy: std::array::from_fn(|_| AtomicBool::new(false)),
            root,
            scope,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Actions currently in flight.
    pub fn busy_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.busy[a.index()].load(Ordering::SeqCst))
            .collect()
    }

    /// Claim `action`. Fails after shutdown, if it needs a device and none
    /// is connected, or if the same action is already running.
    pub fn begin(&self, action: Action) -> Result<ActionGuard<'_>, SessionError> {
        if self.is_shut_down() {
            return Err(SessionError::Cancelled);
        }
        if action.requires_device() && !self.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let flag = &self.busy[action.index()];
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::Busy(action));
        }

        Ok(ActionGuard {
            session: self,
            action,
            token: self.current_scope().child_token(),
        })
    }

    /// Cancel everything in flight and open a fresh scope for new actions.
    pub fn cancel_in_flight(&self) {
        let mut scope = self.scope.lock().unwrap_or_else(|e| e.into_inner());
        scope.cancel();
        *scope = self.root.child_token();
    }

    /// Cancel everything, now and for any action started later.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    fn current_scope(&self) -> CancellationToken {
        self.scope
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for DeviceSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that an action was claimed. Releases the busy flag on drop.
pub struct ActionGuard<'a> {
    session: &'a DeviceSession,
    action: Action,
    token: CancellationToken,
}

impl ActionGuard<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` unless the scope is cancelled first. A cancelled request
    /// is dropped, so its result is never applied.
    pub async fn run<T>(&self, fut: impl Future<Output = T>) -> Result<T, SessionError> {
        let out = tokio::select! {
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        };
        match out {
            Some(out) if !self.token.is_cancelled() => Ok(out),
            _ => {
                tracing::debug!("{:?} cancelled, result dropped", self.action);
                Err(SessionError::Cancelled)
            }
        }
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.session.busy[self.action.index()].store(false, Ordering::SeqCst);
    }
}
