//! Game event bus consumed by the Strategic Coordinator
//!
//! The bus fans published events out to per-subscriber mailboxes. Each
//! coordinator owns its receiver and drains it synchronously at the top of
//! its tick step, so trigger state is only ever mutated by the coordinator's
//! own code. There are no ambient shared flags.

use crate::core::types::{PlayerId, UnitId};
use tokio::sync::mpsc;

/// Events carried on the bus
///
/// Produced by host systems (input handling, combat resolution, construction)
/// which live outside this crate.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Player issued a voice/text command with no specific unit selection
    PlayerCommand { player: PlayerId, transcript: String },
    /// Player issued a command targeted at specific units
    ///
    /// Also seeds a standing order for every target unit.
    UnitCommand {
        player: PlayerId,
        transcript: String,
        targets: Vec<UnitId>,
    },
    /// A unit was destroyed
    UnitDestroyed { unit: UnitId, owner: PlayerId },
    /// A building finished construction
    BuildingCompleted { building: String, owner: PlayerId },
}

/// Fan-out publisher for game events
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber and return its mailbox
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    ///
    /// Subscribers whose mailbox has been dropped are pruned.
    pub fn publish(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let mut rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();

        bus.publish(GameEvent::PlayerCommand {
            player: PlayerId(0),
            transcript: "hold the line".into(),
        });

        assert!(matches!(
            rx_a.try_recv(),
            Ok(GameEvent::PlayerCommand { .. })
        ));
        assert!(matches!(
            rx_b.try_recv(),
            Ok(GameEvent::PlayerCommand { .. })
        ));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);

        bus.publish(GameEvent::UnitDestroyed {
            unit: UnitId::from("U1"),
            owner: PlayerId(0),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
