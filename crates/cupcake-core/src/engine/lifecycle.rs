//! Lifecycle management for the shop engine.
//!
//! Handles start-up (analytics, sign-in, first catalog fetch) and shutdown.

use super::{EngineError, ShopEngine};
use crate::handlers::AnalyticsHandler;
use cupcake_types::{truncate_id, CatalogEvent, ShopEvent};
use std::sync::Arc;

impl ShopEngine {
	/// Signs the customer in and resolves the catalog.
	///
	/// Neither step can fail the start-up: a failed sign-in continues signed
	/// out and a failed fetch serves the fallback catalog. The catalog ready
	/// event is published the first time only.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		tracing::info!(shop = %self.config.shop.id, "Initializing shop engine");

		{
			let mut task = self.analytics_task.lock().await;
			if task.is_none() {
				let handler = AnalyticsHandler::with_counters(Arc::clone(&self.analytics));
				*task = Some(handler.spawn(&self.event_bus));
			}
		}

		let session = self.account.sign_in().await;
		if let Some(user_id) = session.user_id() {
			tracing::debug!(user_id = %truncate_id(user_id), "Session established");
		}
		*self.session.write().await = session;

		let was_ready = self.catalog.is_ready();
		let snapshot = self.catalog.refresh().await;
		if !was_ready {
			tracing::info!(
				source = ?snapshot.source,
				flavors = snapshot.config.flavors.len(),
				"Catalog ready"
			);
			self.event_bus
				.publish(ShopEvent::Catalog(CatalogEvent::Ready {
					source: snapshot.source,
				}))
				.ok();
		}

		Ok(())
	}

	/// Stops background tasks owned by the engine.
	///
	/// Saves already handed to the history store keep running.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down shop engine");

		if let Some(task) = self.analytics_task.lock().await.take() {
			task.abort();
		}

		Ok(())
	}
}
