//! Display state of the order history screen.

use crate::HistoryStore;
use cupcake_types::{truncate_id, OrderRecord};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Mirrors the store's published record sequences for one screen.
///
/// The list is empty until the first successful retrieval and afterwards
/// always equals the last sequence received for the view's user. Sequences
/// published before the view was opened, or for other users, are not shown.
pub struct HistoryView {
	orders: watch::Receiver<Vec<OrderRecord>>,
	forwarder: JoinHandle<()>,
}

impl HistoryView {
	/// Opens the view and triggers one retrieval for `user_id`.
	///
	/// Must be called within a tokio runtime.
	pub fn open(store: Arc<HistoryStore>, user_id: impl Into<String>) -> Self {
		let user_id = user_id.into();
		let mut upstream = store.subscribe();
		upstream.borrow_and_update();

		let (sender, orders) = watch::channel(Vec::new());
		let forwarder = tokio::spawn(async move {
			if store.list_for(&user_id).await.is_err() {
				tracing::debug!(
					user_id = %truncate_id(&user_id),
					"History view keeps its previous list"
				);
			}
			while upstream.changed().await.is_ok() {
				let sequence = {
					let published = upstream.borrow_and_update();
					if published.user_id != user_id {
						continue;
					}
					published.records.clone()
				};
				if sender.send(sequence).is_err() {
					break;
				}
			}
		});

		Self { orders, forwarder }
	}

	/// The records currently displayed.
	pub fn orders(&self) -> Vec<OrderRecord> {
		self.orders.borrow().clone()
	}

	/// Receiver of every list the view displays.
	pub fn subscribe(&self) -> watch::Receiver<Vec<OrderRecord>> {
		self.orders.clone()
	}

	/// Waits for the displayed list to change.
	///
	/// Returns false once the view can no longer change.
	pub async fn changed(&mut self) -> bool {
		self.orders.changed().await.is_ok()
	}
}

impl Drop for HistoryView {
	fn drop(&mut self) {
		self.forwarder.abort();
	}
}
