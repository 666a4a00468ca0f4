//! Event types for inter-service communication.
//!
//! Events flow through the event bus so that observers (analytics logging, the
//! shell, tests) can react to what the wizard and the services did without
//! the producers knowing about them.

use crate::{CatalogSource, WizardStep};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Main event type encompassing all shop events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopEvent {
	/// Events from the order wizard.
	Order(OrderEvent),
	/// Events from the history store client.
	History(HistoryEvent),
	/// Events from the catalog provider.
	Catalog(CatalogEvent),
}

/// Events related to the order wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
	/// An order passed validation and was handed to the history store.
	Sent { quantity: u32, flavor: String },
	/// The customer abandoned the order on the given screen.
	Cancelled { step: WizardStep },
}

/// Events related to order persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEvent {
	/// A record was written under the user's order collection.
	Saved { record_id: String },
	/// Writing a record failed. Nothing is retried.
	SaveFailed { error: String },
}

/// Events related to the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
	/// The catalog resolved for the first time.
	Ready { source: CatalogSource },
}

/// Broadcast bus carrying shop events to any number of subscribers.
///
/// Publishing never blocks and never fails the producer: with no subscriber
/// the event is dropped, and slow subscribers see `Lagged` instead of holding
/// the producer back.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<ShopEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to every event published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	pub fn publish(
		&self,
		event: ShopEvent,
	) -> Result<(), broadcast::error::SendError<ShopEvent>> {
		self.sender.send(event).map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_publish_reaches_subscribers() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.clone().subscribe();

		let event = ShopEvent::Order(OrderEvent::Cancelled {
			step: WizardStep::Pickup,
		});
		bus.publish(event.clone()).unwrap();

		assert_eq!(first.recv().await.unwrap(), event);
		assert_eq!(second.recv().await.unwrap(), event);
	}

	#[test]
	fn test_publish_without_subscribers_is_an_error_only() {
		let bus = EventBus::new(8);
		let result = bus.publish(ShopEvent::History(HistoryEvent::SaveFailed {
			error: "offline".into(),
		}));
		assert!(result.is_err());
	}
}
