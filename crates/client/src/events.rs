//! Auth lifecycle event bus
//!
//! Session-management code outside this crate (login screens, cached user
//! state) reacts to the token lifecycle through this bus instead of being
//! called directly, so the client core has no dependency on any UI.

use tokio::sync::broadcast;

/// Events emitted while the client manages the session token lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A refresh completed and a new access token is active
    TokenRefreshed {
        /// The newly issued access token
        access_token: String,
    },

    /// The session could not be (re)authenticated
    AuthenticationFailed {
        /// Status of the failure (0 when no HTTP response was observed)
        status: u16,
        /// Human-readable failure message
        message: String,
        /// URL whose failure ended the session
        url: String,
    },
}

/// Broadcast channel for [`AuthEvent`]s.
///
/// Clones publish into the same channel. Publishing never blocks and never
/// fails; with zero subscribers it is a no-op. Each subscriber receives
/// every event in publish order.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: AuthEvent) {
        // send only errors when there are no receivers, which is fine here
        let _ = self.tx.send(event);
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = AuthEventBus::new(4);
        bus.publish(AuthEvent::TokenRefreshed { access_token: "a1".to_string() });
    }

    #[tokio::test]
    async fn every_subscriber_receives_events_in_publish_order() {
        let bus = AuthEventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(AuthEvent::TokenRefreshed { access_token: "a1".to_string() });
        bus.publish(AuthEvent::AuthenticationFailed {
            status: 401,
            message: "expired".to_string(),
            url: "http://localhost/api/runs".to_string(),
        });

        for rx in [&mut first, &mut second] {
            let event = rx.recv().await.expect("first event");
            assert_eq!(event, AuthEvent::TokenRefreshed { access_token: "a1".to_string() });

            let event = rx.recv().await.expect("second event");
            assert!(matches!(event, AuthEvent::AuthenticationFailed { status: 401, .. }));
        }
    }

    #[tokio::test]
    async fn clones_share_the_channel() {
        let bus = AuthEventBus::new(4);
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        clone.publish(AuthEvent::TokenRefreshed { access_token: "a2".to_string() });

        let event = rx.recv().await.expect("event");
        assert_eq!(event, AuthEvent::TokenRefreshed { access_token: "a2".to_string() });
    }
}
