//! Broadcast channel for router events.

use router_types::RouterEvent;
use tokio::sync::broadcast;

/// Publishes committed-operation events to any number of subscribers.
///
/// Subscribers that fall behind by more than the channel capacity miss the
/// oldest events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<RouterEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
		self.sender.subscribe()
	}

	/// Sends an event; fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: RouterEvent,
	) -> Result<(), broadcast::error::SendError<RouterEvent>> {
		self.sender.send(event).map(|_| ())
	}
}
