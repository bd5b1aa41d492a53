//! Disconnect notification.

use hearth_protocol::AccountId;
use hearth_transport::ConnectionId;
use parking_lot::Mutex;

/// Fired once when a player's connection goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDisconnected {
    pub account_id: AccountId,
    pub connection: ConnectionId,
}

type Listener = Box<dyn Fn(&PlayerDisconnected) + Send + Sync>;

/// Callbacks waiting for [`PlayerDisconnected`].
///
/// Listeners run synchronously, in the order they subscribed, on the task
/// that fires the event. Firing consumes the list, so each listener runs at
/// most once. A listener must not subscribe further listeners.
#[derive(Default)]
pub struct DisconnectListeners {
    listeners: Mutex<Vec<Listener>>,
}

impl DisconnectListeners {
    pub fn subscribe(
        &self,
        listener: impl Fn(&PlayerDisconnected) + Send + Sync + 'static,
    ) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Runs and drops every listener. Returns how many ran.
    pub fn fire(&self, event: &PlayerDisconnected) -> usize {
        // Taken out first so a listener that touches the player again
        // can't deadlock on this lock.
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl std::fmt::Debug for DisconnectListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisconnectListeners")
            .field("len", &self.len())
            .finish()
    }
}
