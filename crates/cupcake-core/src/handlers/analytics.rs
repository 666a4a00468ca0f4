//! Analytics handler for shop events.
//!
//! Turns events published on the bus into structured log lines under the
//! `analytics` target and keeps running totals.

use cupcake_types::{CatalogEvent, EventBus, HistoryEvent, OrderEvent, ShopEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Running event totals.
#[derive(Debug, Default)]
pub struct AnalyticsCounters {
	pub orders_sent: AtomicU64,
	pub orders_cancelled: AtomicU64,
	pub records_saved: AtomicU64,
	pub saves_failed: AtomicU64,
}

impl AnalyticsCounters {
	pub fn orders_sent(&self) -> u64 {
		self.orders_sent.load(Ordering::Relaxed)
	}

	pub fn orders_cancelled(&self) -> u64 {
		self.orders_cancelled.load(Ordering::Relaxed)
	}

	pub fn records_saved(&self) -> u64 {
		self.records_saved.load(Ordering::Relaxed)
	}

	pub fn saves_failed(&self) -> u64 {
		self.saves_failed.load(Ordering::Relaxed)
	}
}

/// Handler for analytics reporting of shop events.
#[derive(Default)]
pub struct AnalyticsHandler {
	counters: Arc<AnalyticsCounters>,
}

impl AnalyticsHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a handler adding to existing counters.
	pub fn with_counters(counters: Arc<AnalyticsCounters>) -> Self {
		Self { counters }
	}

	pub fn counters(&self) -> Arc<AnalyticsCounters> {
		self.counters.clone()
	}

	/// Records one event.
	pub fn handle(&self, event: &ShopEvent) {
		match event {
			ShopEvent::Order(OrderEvent::Sent { quantity, flavor }) => {
				self.counters.orders_sent.fetch_add(1, Ordering::Relaxed);
				tracing::info!(target: "analytics", quantity, flavor = %flavor, "order_sent");
			},
			ShopEvent::Order(OrderEvent::Cancelled { step }) => {
				self.counters.orders_cancelled.fetch_add(1, Ordering::Relaxed);
				tracing::info!(target: "analytics", step = %step, "order_cancelled");
			},
			ShopEvent::History(HistoryEvent::Saved { .. }) => {
				self.counters.records_saved.fetch_add(1, Ordering::Relaxed);
			},
			ShopEvent::History(HistoryEvent::SaveFailed { error }) => {
				self.counters.saves_failed.fetch_add(1, Ordering::Relaxed);
				tracing::warn!(target: "analytics", error = %error, "order_save_failed");
			},
			ShopEvent::Catalog(CatalogEvent::Ready { source }) => {
				tracing::info!(target: "analytics", source = ?source, "catalog_ready");
			},
		}
	}

	/// Consumes events from the bus until it closes.
	///
	/// Must be called within a tokio runtime.
	pub fn spawn(self, event_bus: &EventBus) -> JoinHandle<()> {
		let mut receiver = event_bus.subscribe();
		tokio::spawn(async move {
			loop {
				match receiver.recv().await {
					Ok(event) => self.handle(&event),
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Analytics fell behind, events dropped");
					},
					Err(RecvError::Closed) => break,
				}
			}
		})
	}
}
