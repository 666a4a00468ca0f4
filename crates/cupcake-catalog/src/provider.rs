//! Cached, fallback-safe access to the remote catalog.

use crate::{catalog_from_remote, CatalogError, RemoteConfigInterface};
use cupcake_types::{CatalogConfig, CatalogSource};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::instrument;

/// The catalog currently served, together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
	pub config: CatalogConfig,
	pub source: CatalogSource,
}

impl CatalogSnapshot {
	fn defaults() -> Self {
		Self {
			config: CatalogConfig::defaults(),
			source: CatalogSource::Defaults,
		}
	}
}

/// Bookkeeping guarded by the fetch lock.
#[derive(Default)]
struct FetchState {
	/// Result of the last successful fetch.
	last_good: Option<CatalogConfig>,
	/// When the remote source was last contacted, successfully or not.
	last_attempt: Option<Instant>,
}

impl FetchState {
	fn fallback(&self) -> CatalogSnapshot {
		match &self.last_good {
			Some(config) => CatalogSnapshot {
				config: config.clone(),
				source: CatalogSource::Cached,
			},
			None => CatalogSnapshot::defaults(),
		}
	}
}

/// Serves the catalog for the session.
///
/// At most one fetch is in flight at any time: callers queue on the fetch
/// lock, and whoever gets it second finds the cooldown running and receives
/// the cached result. Failures never reach callers; they get the last good
/// catalog or the fixed defaults.
pub struct CatalogProvider {
	source: Box<dyn RemoteConfigInterface>,
	min_fetch_interval: Duration,
	fetch_timeout: Duration,
	state: Mutex<FetchState>,
	current: watch::Sender<CatalogSnapshot>,
	ready: watch::Sender<bool>,
}

impl CatalogProvider {
	pub fn new(
		source: Box<dyn RemoteConfigInterface>,
		min_fetch_interval: Duration,
		fetch_timeout: Duration,
	) -> Self {
		Self {
			source,
			min_fetch_interval,
			fetch_timeout,
			state: Mutex::new(FetchState::default()),
			current: watch::Sender::new(CatalogSnapshot::defaults()),
			ready: watch::Sender::new(false),
		}
	}

	/// Fetches the catalog, honouring the cooldown.
	pub async fn fetch(&self) -> CatalogConfig {
		self.refresh().await.config
	}

	/// Like [`fetch`](Self::fetch), also reporting where the catalog came from.
	#[instrument(skip_all)]
	pub async fn refresh(&self) -> CatalogSnapshot {
		let mut state = self.state.lock().await;

		let now = Instant::now();
		let cooling_down = state
			.last_attempt
			.is_some_and(|last| now.duration_since(last) < self.min_fetch_interval);
		if cooling_down {
			tracing::debug!("Within fetch cooldown, serving cached catalog");
			let snapshot = state.fallback();
			self.publish(&snapshot);
			return snapshot;
		}
		state.last_attempt = Some(now);

		let snapshot = match self.fetch_remote().await {
			Ok(config) => {
				tracing::info!(
					flavors = config.flavors.len(),
					largest_tier = config.largest_tier(),
					discount = config.discount_enabled,
					"Fetched remote catalog"
				);
				state.last_good = Some(config.clone());
				CatalogSnapshot {
					config,
					source: CatalogSource::Remote,
				}
			},
			Err(e) => {
				let snapshot = state.fallback();
				tracing::warn!(
					error = %e,
					source = ?snapshot.source,
					"Catalog fetch failed, serving fallback"
				);
				snapshot
			},
		};

		self.publish(&snapshot);
		snapshot
	}

	async fn fetch_remote(&self) -> Result<CatalogConfig, CatalogError> {
		let values = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
			.await
			.map_err(|_| CatalogError::Timeout(self.fetch_timeout))??;
		catalog_from_remote(&values)
	}

	fn publish(&self, snapshot: &CatalogSnapshot) {
		self.current.send_replace(snapshot.clone());
		let flipped = self.ready.send_if_modified(|ready| {
			if *ready {
				false
			} else {
				*ready = true;
				true
			}
		});
		if flipped {
			tracing::debug!(source = ?snapshot.source, "Catalog ready");
		}
	}

	/// The catalog served by the most recent fetch, or the defaults before the
	/// first one. Never contacts the remote source.
	pub fn current(&self) -> CatalogConfig {
		self.current.borrow().config.clone()
	}

	pub fn snapshot(&self) -> CatalogSnapshot {
		self.current.borrow().clone()
	}

	/// Whether a first fetch has completed.
	pub fn is_ready(&self) -> bool {
		*self.ready.borrow()
	}

	/// Receiver of the one-shot ready signal. It starts false, turns true
	/// after the first fetch completes and never reverts.
	pub fn ready(&self) -> watch::Receiver<bool> {
		self.ready.subscribe()
	}

	/// Waits until the first fetch has completed.
	pub async fn wait_ready(&self) {
		let mut ready = self.ready.subscribe();
		// The sender lives in self, so the channel cannot close while waiting
		let _ = ready.wait_for(|ready| *ready).await;
	}
}
