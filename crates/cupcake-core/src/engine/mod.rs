//! Shop engine that owns the services of one running shop.
//!
//! The engine is the composition root: it holds the account, catalog,
//! storage and history services, the signed-in session and the event bus,
//! and hands out wizards and history views wired to them.

pub mod lifecycle;

use crate::handlers::{AnalyticsCounters, PushTokenRegistrar};
use crate::state::{OrderState, OrderWizard, PriceTable};
use cupcake_account::AccountService;
use cupcake_catalog::CatalogProvider;
use cupcake_config::Config;
use cupcake_history::{HistoryStore, HistoryView};
use cupcake_storage::StorageService;
use cupcake_types::{Clock, EventBus, Session};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
}

/// Main shop engine.
pub struct ShopEngine {
	/// Shop configuration.
	pub(crate) config: Config,
	/// Sign-in service.
	pub(crate) account: Arc<AccountService>,
	/// Catalog provider backed by the remote config source.
	pub(crate) catalog: Arc<CatalogProvider>,
	/// Storage service for order records.
	#[allow(dead_code)]
	pub(crate) storage: Arc<StorageService>,
	/// History store client.
	pub(crate) history: Arc<HistoryStore>,
	/// Event bus for inter-service communication.
	pub(crate) event_bus: EventBus,
	pub(crate) clock: Arc<dyn Clock>,
	/// Sink for push notification tokens.
	pub(crate) push_tokens: Arc<PushTokenRegistrar>,
	/// Session established by `initialize`.
	pub(crate) session: RwLock<Session>,
	pub(crate) analytics: Arc<AnalyticsCounters>,
	/// Running analytics task, if started.
	pub(crate) analytics_task: Mutex<Option<JoinHandle<()>>>,
}

impl ShopEngine {
	/// Creates a new shop engine with the given services.
	pub fn new(
		config: Config,
		account: Arc<AccountService>,
		catalog: Arc<CatalogProvider>,
		storage: Arc<StorageService>,
		event_bus: EventBus,
		clock: Arc<dyn Clock>,
	) -> Self {
		let history = Arc::new(HistoryStore::new(
			storage.clone(),
			clock.clone(),
			event_bus.clone(),
			Duration::from_secs(config.history.list_timeout_seconds),
		));

		Self {
			config,
			account,
			catalog,
			storage,
			history,
			event_bus,
			clock,
			push_tokens: Arc::new(PushTokenRegistrar::new()),
			session: RwLock::new(Session::signed_out()),
			analytics: Arc::new(AnalyticsCounters::default()),
			analytics_task: Mutex::new(None),
		}
	}

	/// Starts a wizard for the current session with the current catalog.
	pub async fn new_wizard(&self) -> OrderWizard {
		let pricing = &self.config.pricing;
		let state = OrderState::new(
			PriceTable::from_config(pricing),
			pricing.pickup_days,
			self.clock.clone(),
		);
		OrderWizard::new(
			state,
			self.catalog.current(),
			self.session().await,
			self.history.clone(),
			self.event_bus.clone(),
		)
	}

	/// Opens the history screen for the signed-in user.
	///
	/// Returns `None` when nobody is signed in.
	pub async fn open_history_view(&self) -> Option<HistoryView> {
		let session = self.session().await;
		let user_id = session.user_id()?;
		Some(HistoryView::open(self.history.clone(), user_id))
	}

	pub async fn session(&self) -> Session {
		self.session.read().await.clone()
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn catalog(&self) -> &Arc<CatalogProvider> {
		&self.catalog
	}

	pub fn history(&self) -> &Arc<HistoryStore> {
		&self.history
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn push_tokens(&self) -> &Arc<PushTokenRegistrar> {
		&self.push_tokens
	}

	/// Event totals gathered since `initialize`.
	pub fn analytics(&self) -> &Arc<AnalyticsCounters> {
		&self.analytics
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::{ShopBuilder, ShopFactories};
	use crate::state::SubmitError;
	use chrono::NaiveDate;
	use cupcake_config::builders::config::ConfigBuilder;
	use cupcake_types::{
		CatalogEvent, CatalogSource, FixedClock, ImplementationRegistry, ShopEvent, WizardStep,
	};
	use std::collections::HashMap;

	fn clock() -> Arc<dyn Clock> {
		Arc::new(FixedClock::new(
			NaiveDate::from_ymd_opt(2026, 10, 17)
				.unwrap()
				.and_hms_opt(10, 0, 0)
				.unwrap(),
		))
	}

	fn factories() -> ShopFactories<
		cupcake_storage::StorageFactory,
		cupcake_account::AccountFactory,
		cupcake_catalog::RemoteConfigFactory,
	> {
		ShopFactories {
			storage_factories: cupcake_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			account_factories: cupcake_account::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			catalog_factories: cupcake_catalog::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	fn static_user(user_id: &str) -> toml::Table {
		let mut table = toml::Table::new();
		table.insert("user_id".into(), toml::Value::String(user_id.into()));
		table.insert("display_name".into(), toml::Value::String("Sam".into()));
		table
	}

	async fn engine(config: Config) -> ShopEngine {
		ShopBuilder::new(config)
			.with_clock(clock())
			.build(factories())
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_order_then_history_end_to_end() {
		let config = ConfigBuilder::new()
			.account(
				cupcake_account::implementations::static_user::Registry::NAME,
				static_user("user-42"),
			)
			.build();
		let engine = engine(config).await;
		engine.initialize().await.unwrap();

		let mut wizard = engine.new_wizard().await;
		wizard.select_quantity(6).unwrap();
		wizard.select_flavor("Vanilla").unwrap();
		wizard.next().unwrap();
		wizard.select_date("Mon Oct 19").unwrap();
		wizard.next().unwrap();
		let submission = wizard.submit().unwrap();
		submission.save.await.unwrap();

		let records = engine.history().list_for("user-42").await.unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].quantity, 6);
		assert_eq!(records[0].flavor, "Vanilla");

		let mut view = engine.open_history_view().await.unwrap();
		assert!(view.changed().await);
		assert_eq!(view.orders(), records);

		engine.shutdown().await.unwrap();
	}

	#[tokio::test]
	async fn test_initialize_publishes_catalog_ready_once() {
		let engine = engine(ConfigBuilder::new().build()).await;
		let mut events = engine.event_bus().subscribe();

		engine.initialize().await.unwrap();
		assert!(engine.catalog().is_ready());
		assert_eq!(
			events.recv().await.unwrap(),
			ShopEvent::Catalog(CatalogEvent::Ready {
				source: CatalogSource::Remote
			})
		);

		engine.initialize().await.unwrap();
		assert!(events.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_catalog_values_reach_the_wizard() {
		let mut values = toml::Table::new();
		values.insert("flavour1".into(), toml::Value::String("Lemon".into()));
		values.insert("twelve_cupcakes_enabled".into(), toml::Value::Boolean(false));
		let config = ConfigBuilder::new().catalog("static", values).build();
		let engine = engine(config).await;
		engine.initialize().await.unwrap();

		let mut wizard = engine.new_wizard().await;
		assert_eq!(wizard.catalog().largest_tier(), 6);
		assert!(wizard.select_quantity(12).is_err());
		wizard.select_quantity(6).unwrap();
		wizard.select_flavor("Lemon").unwrap();
		assert_eq!(wizard.step(), WizardStep::Flavor);
	}

	#[tokio::test]
	async fn test_anonymous_session_saves_records() {
		let engine = engine(ConfigBuilder::new().build()).await;
		engine.initialize().await.unwrap();
		let session = engine.session().await;
		let user_id = session.user_id().unwrap().to_string();

		let mut wizard = engine.new_wizard().await;
		wizard.select_quantity(12).unwrap();
		wizard.select_flavor("Coffee").unwrap();
		wizard.next().unwrap();
		wizard.select_date("Sun Oct 18").unwrap();
		wizard.next().unwrap();
		assert!(matches!(wizard.submit(), Err(SubmitError::OutOfStock { .. })));

		wizard.cancel();
		wizard.select_quantity(12).unwrap();
		wizard.select_flavor("Chocolate").unwrap();
		wizard.next().unwrap();
		wizard.select_date("Sun Oct 18").unwrap();
		wizard.next().unwrap();
		wizard.submit().unwrap().save.await.unwrap();

		let records = engine.history().list_for(&user_id).await.unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].flavor, "Chocolate");
	}

	#[tokio::test]
	async fn test_signed_out_session_has_no_history_view() {
		let config = ConfigBuilder::new()
			.account("static", static_user(""))
			.build();
		let engine = engine(config).await;
		engine.initialize().await.unwrap();

		assert!(!engine.session().await.signed_in);
		assert!(engine.open_history_view().await.is_none());
	}

	#[tokio::test]
	async fn test_unknown_primary_fails_to_build() {
		let mut config = ConfigBuilder::new().build();
		config.storage.implementations = HashMap::new();
		let result = ShopBuilder::new(config).build(factories()).await;
		assert!(result.is_err());
	}
}
