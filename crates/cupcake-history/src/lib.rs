//! Order history for the cupcake shop.
//!
//! Submitted orders are appended as records under the signed-in user's
//! collection (`users/{uid}/orders`). Saving is fire-and-forget: the wizard
//! never waits on it and never hears about failures, which are logged and
//! published on the event bus instead. Listing republishes the user's full
//! record sequence, tagged with the user id, to every subscriber.

use cupcake_storage::{StorageError, StorageService};
use cupcake_types::{
	truncate_id, Clock, EventBus, HistoryEvent, Order, OrderRecord, ShopEvent, StorageKey,
	RECORD_DATE_FORMAT,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

mod view;

pub use view::HistoryView;

/// Errors that can occur while saving or listing order records.
#[derive(Debug, Error)]
pub enum HistoryError {
	/// No user is signed in, so there is no collection to read.
	#[error("Not signed in")]
	NotSignedIn,
	/// Error from the storage backend.
	#[error("Storage error: {0}")]
	Storage(String),
	/// The retrieval did not complete in time.
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
	/// The background save task panicked or was cancelled.
	#[error("Save task failed: {0}")]
	Task(String),
}

impl From<StorageError> for HistoryError {
	fn from(err: StorageError) -> Self {
		HistoryError::Storage(err.to_string())
	}
}

/// Handle to a save running in the background.
///
/// Dropping the handle leaves the save running. Awaiting it yields the id of
/// the new record, or `None` when the save was skipped because nobody is
/// signed in.
pub struct SaveHandle {
	task: Option<JoinHandle<Result<Option<String>, HistoryError>>>,
}

impl SaveHandle {
	fn skipped() -> Self {
		Self { task: None }
	}

	/// Whether the save was skipped without contacting the store.
	pub fn is_skipped(&self) -> bool {
		self.task.is_none()
	}
}

impl Future for SaveHandle {
	type Output = Result<Option<String>, HistoryError>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match self.task.as_mut() {
			None => Poll::Ready(Ok(None)),
			Some(task) => Pin::new(task)
				.poll(cx)
				.map(|joined| joined.unwrap_or_else(|e| Err(HistoryError::Task(e.to_string())))),
		}
	}
}

/// One published record sequence and the user it belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecords {
	pub user_id: String,
	pub records: Vec<OrderRecord>,
}

/// Client of the order record collections.
pub struct HistoryStore {
	storage: Arc<StorageService>,
	clock: Arc<dyn Clock>,
	event_bus: EventBus,
	list_timeout: Duration,
	records: watch::Sender<UserRecords>,
}

impl HistoryStore {
	pub fn new(
		storage: Arc<StorageService>,
		clock: Arc<dyn Clock>,
		event_bus: EventBus,
		list_timeout: Duration,
	) -> Self {
		Self {
			storage,
			clock,
			event_bus,
			list_timeout,
			records: watch::Sender::new(UserRecords::default()),
		}
	}

	/// Appends a record of `order` to the user's collection in the background.
	///
	/// The record is stamped with the local time of this call. An empty user
	/// id skips the save. Must be called within a tokio runtime.
	pub fn save(&self, order: &Order, user_id: &str) -> SaveHandle {
		if user_id.is_empty() {
			tracing::debug!("No signed-in user, order record not saved");
			return SaveHandle::skipped();
		}

		let submitted_at = self.clock.now().format(RECORD_DATE_FORMAT).to_string();
		let record = OrderRecord::from_order(order, submitted_at);
		let namespace = StorageKey::orders_of(user_id);
		let user = truncate_id(user_id);
		let storage = self.storage.clone();
		let event_bus = self.event_bus.clone();

		let task = tokio::spawn(async move {
			match storage.append(&namespace, &record).await {
				Ok(record_id) => {
					tracing::info!(
						user_id = %user,
						record_id = %truncate_id(&record_id),
						quantity = record.quantity,
						flavor = %record.flavor,
						"Order record saved"
					);
					event_bus
						.publish(ShopEvent::History(HistoryEvent::Saved {
							record_id: record_id.clone(),
						}))
						.ok();
					Ok(Some(record_id))
				},
				Err(e) => {
					tracing::warn!(user_id = %user, error = %e, "Failed to save order record");
					event_bus
						.publish(ShopEvent::History(HistoryEvent::SaveFailed {
							error: e.to_string(),
						}))
						.ok();
					Err(HistoryError::from(e))
				},
			}
		});

		SaveHandle { task: Some(task) }
	}

	/// Retrieves every record of the user, oldest first, and publishes the
	/// sequence to subscribers.
	///
	/// On failure the previously published sequence stays as it is.
	#[instrument(skip_all, fields(user_id = %truncate_id(user_id)))]
	pub async fn list_for(&self, user_id: &str) -> Result<Vec<OrderRecord>, HistoryError> {
		let result = self.retrieve(user_id).await;
		match &result {
			Ok(records) => {
				tracing::debug!(count = records.len(), "Retrieved order history");
				self.records.send_replace(UserRecords {
					user_id: user_id.to_string(),
					records: records.clone(),
				});
			},
			Err(e) => tracing::warn!(error = %e, "Failed to retrieve order history"),
		}
		result
	}

	async fn retrieve(&self, user_id: &str) -> Result<Vec<OrderRecord>, HistoryError> {
		if user_id.is_empty() {
			return Err(HistoryError::NotSignedIn);
		}

		let namespace = StorageKey::orders_of(user_id);
		let listed = tokio::time::timeout(
			self.list_timeout,
			self.storage.list::<OrderRecord>(&namespace),
		)
		.await
		.map_err(|_| HistoryError::Timeout(self.list_timeout))??;

		let mut records: Vec<OrderRecord> = listed.into_iter().map(|(_, record)| record).collect();
		// ISO timestamps order lexicographically
		records.sort_by(|a, b| a.date.cmp(&b.date));
		Ok(records)
	}

	/// Receiver of every sequence published by [`list_for`](Self::list_for).
	pub fn subscribe(&self) -> watch::Receiver<UserRecords> {
		self.records.subscribe()
	}

	/// The most recently published sequence, whichever user it belongs to.
	pub fn records(&self) -> UserRecords {
		self.records.borrow().clone()
	}
}
