//! Broadcast bus between tabs.

use crate::protocol::Envelope;
use atelier_types::TabId;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Best-effort, ordered-per-sender fan-out to every open tab.
///
/// `dispatch` delivers to every current subscriber except the tab that
/// originated the envelope. Tabs that subscribe later never see earlier
/// envelopes.
pub trait BroadcastBus: Send + Sync {
    fn subscribe(&self, tab: TabId) -> mpsc::UnboundedReceiver<Envelope>;

    fn dispatch(&self, envelope: Envelope);
}

/// In-process bus. Subscribers whose receiver was dropped are pruned on the
/// next dispatch.
#[derive(Default)]
pub struct LocalBus {
    subscribers: Mutex<Vec<(TabId, mpsc::UnboundedSender<Envelope>)>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl BroadcastBus for LocalBus {
    fn subscribe(&self, tab: TabId) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.push((tab, tx));
        rx
    }

    fn dispatch(&self, envelope: Envelope) {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = subscribers.len();
        subscribers.retain(|(tab, tx)| {
            if envelope.is_from(*tab) {
                !tx.is_closed()
            } else {
                tx.send(envelope.clone()).is_ok()
            }
        });
        if subscribers.len() < before {
            debug!("pruned {} closed bus subscribers", before - subscribers.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RegistryAction;
    use atelier_types::ProjectUid;

    fn remove_envelope() -> Envelope {
        remove_envelope_from(TabId::new())
    }

    fn remove_envelope_from(origin: TabId) -> Envelope {
        Envelope::new(
            origin,
            RegistryAction::Remove {
                uid: ProjectUid::from("p"),
            },
        )
    }

    #[test]
    fn delivers_to_every_subscriber() {
        let bus = LocalBus::new();
        let mut a = bus.subscribe(TabId::new());
        let mut b = bus.subscribe(TabId::new());
        let env = remove_envelope();
        bus.dispatch(env.clone());
        assert_eq!(a.try_recv().unwrap(), env);
        assert_eq!(b.try_recv().unwrap(), env);
    }

    #[test]
    fn prunes_dropped_subscribers() {
        let bus = LocalBus::new();
        let _a = bus.subscribe(TabId::new());
        drop(bus.subscribe(TabId::new()));
        bus.dispatch(remove_envelope());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn late_subscriber_misses_earlier_envelopes() {
        let bus = LocalBus::new();
        bus.dispatch(remove_envelope());
        let mut late = bus.subscribe(TabId::new());
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn sender_does_not_receive_its_own_envelopes() {
        let bus = LocalBus::new();
        let sender = TabId::new();
        let mut own = bus.subscribe(sender);
        let mut other = bus.subscribe(TabId::new());
        bus.dispatch(remove_envelope_from(sender));
        assert!(own.try_recv().is_err());
        assert!(other.try_recv().is_ok());
    }

    #[test]
    fn closed_sender_subscription_is_pruned() {
        let bus = LocalBus::new();
        let sender = TabId::new();
        drop(bus.subscribe(sender));
        let _other = bus.subscribe(TabId::new());
        bus.dispatch(remove_envelope_from(sender));
        assert_eq!(bus.subscriber_count(), 1);
    }
}
