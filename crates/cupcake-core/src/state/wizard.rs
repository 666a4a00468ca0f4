//! Order wizard state machine.
//!
//! Drives the customer through Start -> Flavor -> Pickup -> Summary, with a
//! History side branch off Start. Selections are checked against the catalog
//! as they are made; the stock and date rules are checked at submission.

use super::order::OrderState;
use cupcake_history::{HistoryStore, SaveHandle};
use cupcake_types::{
	CatalogConfig, EventBus, Order, OrderEvent, Session, ShopEvent, WizardStep,
};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Flavor that cannot be baked in the largest tier.
pub const OUT_OF_STOCK_FLAVOR: &str = "Coffee";

/// Errors raised by navigation and selections.
///
/// A failed call leaves both the order and the current step unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
	#[error("Invalid step transition from {from} to {to}")]
	InvalidTransition { from: WizardStep, to: WizardStep },
	#[error("Cannot {action} on the {step} screen")]
	WrongStep {
		action: &'static str,
		step: WizardStep,
	},
	#[error("Quantity {0} is not offered")]
	UnknownQuantity(u32),
	#[error("Flavor '{0}' is not offered")]
	UnknownFlavor(String),
	#[error("'{0}' is not an available pickup date")]
	UnknownPickupDate(String),
	#[error("Select a {0} first")]
	MissingSelection(&'static str),
}

/// Reasons a submission is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
	#[error("{flavor} is out of stock for {quantity} cupcakes")]
	OutOfStock { quantity: u32, flavor: String },
	#[error("Pickup on {date} is too close, choose a later date")]
	DateTooClose { date: String },
	#[error("Orders can only be submitted from the summary, not from {0}")]
	InvalidStep(WizardStep),
}

/// An accepted order.
pub struct Submission {
	/// Snapshot of the order as submitted.
	pub order: Order,
	/// The background save of the order record. Awaiting it is optional.
	pub save: SaveHandle,
}

/// Allowed moves between steps.
static TRANSITIONS: Lazy<HashMap<WizardStep, HashSet<WizardStep>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		WizardStep::Start,
		HashSet::from([WizardStep::Flavor, WizardStep::History]),
	);
	m.insert(
		WizardStep::Flavor,
		HashSet::from([WizardStep::Pickup, WizardStep::Start]),
	);
	m.insert(
		WizardStep::Pickup,
		HashSet::from([WizardStep::Summary, WizardStep::Flavor, WizardStep::Start]),
	);
	m.insert(
		WizardStep::Summary,
		HashSet::from([WizardStep::Pickup, WizardStep::Start]),
	);
	m.insert(WizardStep::History, HashSet::from([WizardStep::Start]));
	m
});

fn is_valid_transition(from: WizardStep, to: WizardStep) -> bool {
	TRANSITIONS.get(&from).is_some_and(|set| set.contains(&to))
}

/// One customer's pass through the ordering screens.
pub struct OrderWizard {
	step: WizardStep,
	state: OrderState,
	catalog: CatalogConfig,
	session: Session,
	history: Arc<HistoryStore>,
	event_bus: EventBus,
}

impl OrderWizard {
	pub fn new(
		state: OrderState,
		catalog: CatalogConfig,
		session: Session,
		history: Arc<HistoryStore>,
		event_bus: EventBus,
	) -> Self {
		let mut state = state;
		state.set_discount_enabled(catalog.discount_enabled);
		Self {
			step: WizardStep::Start,
			state,
			catalog,
			session,
			history,
			event_bus,
		}
	}

	pub fn step(&self) -> WizardStep {
		self.step
	}

	pub fn order(&self) -> &Order {
		self.state.order()
	}

	pub fn catalog(&self) -> &CatalogConfig {
		&self.catalog
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn pickup_options(&self) -> Vec<String> {
		self.state.pickup_options()
	}

	/// Replaces the catalog used for validation, e.g. after a refresh.
	pub fn set_catalog(&mut self, catalog: CatalogConfig) {
		self.state.set_discount_enabled(catalog.discount_enabled);
		self.catalog = catalog;
	}

	fn transition(&mut self, to: WizardStep) -> Result<(), WizardError> {
		if !is_valid_transition(self.step, to) {
			return Err(WizardError::InvalidTransition {
				from: self.step,
				to,
			});
		}
		tracing::debug!(from = %self.step, to = %to, "Wizard step");
		self.step = to;
		Ok(())
	}

	fn expect_step(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
		if self.step != step {
			return Err(WizardError::WrongStep {
				action,
				step: self.step,
			});
		}
		Ok(())
	}

	/// Chooses a quantity tier on the start screen and moves on to flavors.
	pub fn select_quantity(&mut self, quantity: u32) -> Result<(), WizardError> {
		if self.step != WizardStep::Start {
			return Err(WizardError::InvalidTransition {
				from: self.step,
				to: WizardStep::Flavor,
			});
		}
		if !self.catalog.offers_quantity(quantity) {
			return Err(WizardError::UnknownQuantity(quantity));
		}
		self.state.set_quantity(quantity);
		tracing::info!(quantity, "Quantity selected");
		self.transition(WizardStep::Flavor)
	}

	pub fn select_flavor(&mut self, flavor: &str) -> Result<(), WizardError> {
		self.expect_step(WizardStep::Flavor, "choose a flavor")?;
		if !self.catalog.offers_flavor(flavor) {
			return Err(WizardError::UnknownFlavor(flavor.to_string()));
		}
		self.state.set_flavor(flavor);
		tracing::info!(flavor, "Flavor selected");
		Ok(())
	}

	pub fn select_date(&mut self, pickup_date: &str) -> Result<(), WizardError> {
		self.expect_step(WizardStep::Pickup, "choose a pickup date")?;
		if !self.state.pickup_options().iter().any(|d| d == pickup_date) {
			return Err(WizardError::UnknownPickupDate(pickup_date.to_string()));
		}
		self.state.set_date(pickup_date);
		tracing::info!(pickup_date, "Pickup date selected");
		Ok(())
	}

	/// Moves forward once the current screen's selection is made.
	pub fn next(&mut self) -> Result<(), WizardError> {
		match self.step {
			WizardStep::Start => Err(WizardError::MissingSelection("quantity")),
			WizardStep::Flavor => {
				if self.order().flavor.is_empty() {
					return Err(WizardError::MissingSelection("flavor"));
				}
				self.transition(WizardStep::Pickup)
			},
			WizardStep::Pickup => {
				if self.order().pickup_date.is_empty() {
					return Err(WizardError::MissingSelection("pickup date"));
				}
				self.transition(WizardStep::Summary)
			},
			step @ (WizardStep::Summary | WizardStep::History) => Err(WizardError::WrongStep {
				action: "go forward",
				step,
			}),
		}
	}

	/// Goes one screen back. Selections are kept.
	pub fn back(&mut self) -> Result<(), WizardError> {
		let previous = self.step.previous().ok_or(WizardError::WrongStep {
			action: "go back",
			step: self.step,
		})?;
		self.transition(previous)
	}

	/// Abandons the order and returns to the start screen.
	///
	/// Safe to call on any step, any number of times.
	pub fn cancel(&mut self) {
		if self.step.is_ordering() {
			tracing::info!(step = %self.step, "Order cancelled");
			self.event_bus
				.publish(ShopEvent::Order(OrderEvent::Cancelled { step: self.step }))
				.ok();
		}
		self.state.reset();
		self.step = WizardStep::Start;
	}

	pub fn open_history(&mut self) -> Result<(), WizardError> {
		self.transition(WizardStep::History)
	}

	/// Submits the order from the summary screen.
	///
	/// Rejected orders leave the wizard on the summary untouched. Accepted
	/// orders are handed to the history store, and the wizard starts over.
	pub fn submit(&mut self) -> Result<Submission, SubmitError> {
		if self.step != WizardStep::Summary {
			return Err(SubmitError::InvalidStep(self.step));
		}

		let order = self.state.order().clone();

		if order.quantity == self.catalog.largest_tier() && order.flavor == OUT_OF_STOCK_FLAVOR {
			tracing::info!(quantity = order.quantity, flavor = %order.flavor, "Order rejected: out of stock");
			return Err(SubmitError::OutOfStock {
				quantity: order.quantity,
				flavor: order.flavor,
			});
		}

		if order.pickup_date == self.state.today_label() {
			tracing::info!(pickup_date = %order.pickup_date, "Order rejected: pickup too close");
			return Err(SubmitError::DateTooClose {
				date: order.pickup_date,
			});
		}

		let save = self
			.history
			.save(&order, self.session.user_id().unwrap_or_default());

		tracing::info!(
			quantity = order.quantity,
			flavor = %order.flavor,
			price = %order.price,
			pickup_date = %order.pickup_date,
			"Order sent"
		);
		self.event_bus
			.publish(ShopEvent::Order(OrderEvent::Sent {
				quantity: order.quantity,
				flavor: order.flavor.clone(),
			}))
			.ok();

		self.state.reset();
		self.step = WizardStep::Start;

		Ok(Submission { order, save })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::state::order::PriceTable;
	use chrono::NaiveDate;
	use cupcake_storage::implementations::memory::MemoryStorage;
	use cupcake_storage::StorageService;
	use cupcake_types::{Clock, FixedClock, HistoryEvent, QuantityOption};
	use rust_decimal::Decimal;
	use std::time::Duration;

	const TODAY: &str = "Sat Oct 17";
	const LATER: &str = "Mon Oct 19";

	struct Harness {
		wizard: OrderWizard,
		history: Arc<HistoryStore>,
		events: tokio::sync::broadcast::Receiver<ShopEvent>,
	}

	fn harness_with(catalog: CatalogConfig, session: Session) -> Harness {
		let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
			NaiveDate::from_ymd_opt(2026, 10, 17)
				.unwrap()
				.and_hms_opt(11, 15, 0)
				.unwrap(),
		));
		let event_bus = EventBus::new(32);
		let events = event_bus.subscribe();
		let history = Arc::new(HistoryStore::new(
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			clock.clone(),
			event_bus.clone(),
			Duration::from_secs(10),
		));
		let state = OrderState::new(PriceTable::default(), 4, clock);
		Harness {
			wizard: OrderWizard::new(state, catalog, session, history.clone(), event_bus),
			history,
			events,
		}
	}

	fn harness() -> Harness {
		harness_with(
			CatalogConfig::defaults(),
			Session::signed_in("user-1", Some("Sam".into())),
		)
	}

	fn drive(wizard: &mut OrderWizard, quantity: u32, flavor: &str, date: &str) {
		wizard.select_quantity(quantity).unwrap();
		wizard.select_flavor(flavor).unwrap();
		wizard.next().unwrap();
		wizard.select_date(date).unwrap();
		wizard.next().unwrap();
		assert_eq!(wizard.step(), WizardStep::Summary);
	}

	#[tokio::test]
	async fn test_valid_orders_are_saved() {
		let catalog = CatalogConfig::defaults();
		for quantity in [1, 6, 12] {
			for flavor in &catalog.flavors {
				if quantity == 12 && flavor == OUT_OF_STOCK_FLAVOR {
					continue;
				}
				let mut h = harness();
				drive(&mut h.wizard, quantity, flavor, LATER);

				let submission = h.wizard.submit().unwrap();
				assert!(submission.save.await.unwrap().is_some());

				let records = h.history.list_for("user-1").await.unwrap();
				assert_eq!(records.len(), 1);
				assert_eq!(records[0].quantity, quantity);
				assert_eq!(&records[0].flavor, flavor);
				assert_eq!(records[0].price, Decimal::new(2, 0) * Decimal::from(quantity));
				assert_eq!(records[0].date, "2026-10-17T11:15:00");
			}
		}
	}

	#[tokio::test]
	async fn test_submission_resets_and_publishes() {
		let mut h = harness();
		drive(&mut h.wizard, 6, "Vanilla", LATER);

		let submission = h.wizard.submit().unwrap();
		assert_eq!(submission.order.quantity, 6);
		assert_eq!(submission.order.pickup_date, LATER);
		assert_eq!(h.wizard.step(), WizardStep::Start);
		assert!(h.wizard.order().is_empty());

		assert_eq!(
			h.events.recv().await.unwrap(),
			ShopEvent::Order(OrderEvent::Sent {
				quantity: 6,
				flavor: "Vanilla".into()
			})
		);
		submission.save.await.unwrap();
		assert!(matches!(
			h.events.recv().await.unwrap(),
			ShopEvent::History(HistoryEvent::Saved { .. })
		));
	}

	#[tokio::test]
	async fn test_out_of_stock_regardless_of_date() {
		for date in [TODAY, LATER] {
			let mut h = harness();
			drive(&mut h.wizard, 12, "Coffee", date);
			let before = h.wizard.order().clone();

			assert_eq!(
				h.wizard.submit().err(),
				Some(SubmitError::OutOfStock {
					quantity: 12,
					flavor: "Coffee".into()
				})
			);
			assert_eq!(h.wizard.step(), WizardStep::Summary);
			assert_eq!(h.wizard.order(), &before);
			assert!(h.history.list_for("user-1").await.unwrap().is_empty());
		}
	}

	#[tokio::test]
	async fn test_out_of_stock_follows_largest_tier() {
		let mut catalog = CatalogConfig::defaults();
		catalog.quantity_options = vec![QuantityOption::one(), QuantityOption::six()];
		let mut h = harness_with(catalog, Session::signed_in("user-1", None));

		drive(&mut h.wizard, 6, "Coffee", LATER);
		assert!(matches!(
			h.wizard.submit(),
			Err(SubmitError::OutOfStock { quantity: 6, .. })
		));
	}

	#[tokio::test]
	async fn test_same_day_pickup_refused() {
		for (quantity, flavor) in [(1, "Vanilla"), (6, "Chocolate"), (12, "Red Velvet")] {
			let mut h = harness();
			drive(&mut h.wizard, quantity, flavor, TODAY);

			assert_eq!(
				h.wizard.submit().err(),
				Some(SubmitError::DateTooClose { date: TODAY.into() })
			);
			assert_eq!(h.wizard.step(), WizardStep::Summary);
			assert!(h.history.list_for("user-1").await.unwrap().is_empty());
		}
	}

	#[tokio::test]
	async fn test_cancel_from_every_ordering_step() {
		for depth in 1..=3 {
			let mut h = harness();
			h.wizard.select_quantity(6).unwrap();
			if depth >= 2 {
				h.wizard.select_flavor("Vanilla").unwrap();
				h.wizard.next().unwrap();
			}
			if depth >= 3 {
				h.wizard.select_date(LATER).unwrap();
				h.wizard.next().unwrap();
			}
			let step = h.wizard.step();

			h.wizard.cancel();
			assert_eq!(h.wizard.step(), WizardStep::Start);
			assert!(h.wizard.order().is_empty());
			assert_eq!(
				h.events.recv().await.unwrap(),
				ShopEvent::Order(OrderEvent::Cancelled { step })
			);

			// Cancelling again changes nothing and publishes nothing
			h.wizard.cancel();
			assert_eq!(h.wizard.step(), WizardStep::Start);
			assert!(h.wizard.order().is_empty());
			assert!(h.events.try_recv().is_err());
		}
	}

	#[tokio::test]
	async fn test_selections_validated_against_catalog() {
		let mut h = harness();
		assert_eq!(
			h.wizard.select_quantity(3),
			Err(WizardError::UnknownQuantity(3))
		);
		assert_eq!(h.wizard.step(), WizardStep::Start);

		h.wizard.select_quantity(1).unwrap();
		assert_eq!(
			h.wizard.select_flavor("Licorice"),
			Err(WizardError::UnknownFlavor("Licorice".into()))
		);
		assert_eq!(h.wizard.order().flavor, "");

		h.wizard.select_flavor("Vanilla").unwrap();
		h.wizard.next().unwrap();
		assert_eq!(
			h.wizard.select_date("Fri Oct 30"),
			Err(WizardError::UnknownPickupDate("Fri Oct 30".into()))
		);
		assert_eq!(h.wizard.order().pickup_date, "");
	}

	#[tokio::test]
	async fn test_navigation_rules() {
		let mut h = harness();
		assert_eq!(h.wizard.next(), Err(WizardError::MissingSelection("quantity")));
		assert!(matches!(h.wizard.back(), Err(WizardError::WrongStep { .. })));
		assert!(matches!(
			h.wizard.select_flavor("Vanilla"),
			Err(WizardError::WrongStep { .. })
		));

		h.wizard.select_quantity(6).unwrap();
		assert_eq!(h.wizard.next(), Err(WizardError::MissingSelection("flavor")));
		assert!(matches!(
			h.wizard.select_quantity(1),
			Err(WizardError::InvalidTransition { .. })
		));

		h.wizard.select_flavor("Vanilla").unwrap();
		h.wizard.next().unwrap();
		assert_eq!(h.wizard.next(), Err(WizardError::MissingSelection("pickup date")));

		h.wizard.back().unwrap();
		assert_eq!(h.wizard.step(), WizardStep::Flavor);
		assert_eq!(h.wizard.order().flavor, "Vanilla");
		h.wizard.back().unwrap();
		assert_eq!(h.wizard.step(), WizardStep::Start);
		assert_eq!(h.wizard.order().quantity, 6);
	}

	#[tokio::test]
	async fn test_history_branch() {
		let mut h = harness();
		h.wizard.open_history().unwrap();
		assert_eq!(h.wizard.step(), WizardStep::History);
		assert!(matches!(
			h.wizard.select_quantity(1),
			Err(WizardError::InvalidTransition { .. })
		));
		h.wizard.back().unwrap();
		assert_eq!(h.wizard.step(), WizardStep::Start);

		h.wizard.select_quantity(1).unwrap();
		assert_eq!(
			h.wizard.open_history(),
			Err(WizardError::InvalidTransition {
				from: WizardStep::Flavor,
				to: WizardStep::History
			})
		);
		assert!(h.events.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_submit_outside_summary() {
		let mut h = harness();
		assert!(matches!(
			h.wizard.submit(),
			Err(SubmitError::InvalidStep(WizardStep::Start))
		));
	}

	#[tokio::test]
	async fn test_signed_out_submission_is_not_saved() {
		let mut h = harness_with(CatalogConfig::defaults(), Session::signed_out());
		drive(&mut h.wizard, 6, "Vanilla", LATER);

		let submission = h.wizard.submit().unwrap();
		assert!(submission.save.is_skipped());
		assert_eq!(h.wizard.step(), WizardStep::Start);
	}

	#[tokio::test]
	async fn test_discount_from_catalog() {
		let mut catalog = CatalogConfig::defaults();
		catalog.discount_enabled = true;
		let mut h = harness_with(catalog, Session::signed_in("user-1", None));
		drive(&mut h.wizard, 6, "Vanilla", LATER);
		assert_eq!(h.wizard.order().price, Decimal::new(1080, 2));

		let submission = h.wizard.submit().unwrap();
		submission.save.await.unwrap();
		let records = h.history.list_for("user-1").await.unwrap();
		assert_eq!(records[0].price, Decimal::new(1080, 2));
	}
}
