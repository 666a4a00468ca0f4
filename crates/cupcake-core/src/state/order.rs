//! Holder of the order in progress.
//!
//! Every setter overwrites one field and recomputes the price. Nothing is
//! validated here; the wizard checks selections against the catalog before
//! they reach this holder.

use chrono::Days;
use cupcake_config::PricingConfig;
use cupcake_types::{pickup_label, Clock, Order};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// Unit prices, surcharge and discount used to price an order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
	/// Price of one cupcake when the flavor has no override.
	pub unit_price: Decimal,
	/// Per-flavor unit price overrides.
	pub flavor_prices: HashMap<String, Decimal>,
	/// Flat amount added when the pickup date is today.
	pub same_day_surcharge: Decimal,
	/// Multiplier applied to the cupcake subtotal while the discount is on.
	pub discount_multiplier: Decimal,
}

impl PriceTable {
	pub fn from_config(config: &PricingConfig) -> Self {
		Self {
			unit_price: config.unit_price,
			flavor_prices: config.flavor_prices.clone(),
			same_day_surcharge: config.same_day_surcharge,
			discount_multiplier: config.discount_multiplier,
		}
	}

	/// Unit price of `flavor`, falling back to the base price.
	pub fn unit_price(&self, flavor: &str) -> Decimal {
		self.flavor_prices
			.get(flavor)
			.copied()
			.unwrap_or(self.unit_price)
	}
}

impl Default for PriceTable {
	fn default() -> Self {
		Self::from_config(&PricingConfig::default())
	}
}

/// The in-progress order with its live price.
pub struct OrderState {
	order: Order,
	prices: PriceTable,
	discount_enabled: bool,
	pickup_days: u32,
	clock: Arc<dyn Clock>,
}

impl OrderState {
	pub fn new(prices: PriceTable, pickup_days: u32, clock: Arc<dyn Clock>) -> Self {
		Self {
			order: Order::empty(),
			prices,
			discount_enabled: false,
			pickup_days,
			clock,
		}
	}

	pub fn order(&self) -> &Order {
		&self.order
	}

	pub fn set_quantity(&mut self, quantity: u32) {
		self.order.quantity = quantity;
		self.update_price();
	}

	pub fn set_flavor(&mut self, flavor: impl Into<String>) {
		self.order.flavor = flavor.into();
		self.update_price();
	}

	pub fn set_date(&mut self, pickup_date: impl Into<String>) {
		self.order.pickup_date = pickup_date.into();
		self.update_price();
	}

	/// Turns the catalog discount on or off and reprices the order.
	pub fn set_discount_enabled(&mut self, enabled: bool) {
		self.discount_enabled = enabled;
		if !self.order.is_empty() {
			self.update_price();
		}
	}

	pub fn discount_enabled(&self) -> bool {
		self.discount_enabled
	}

	/// Clears every field, including the price.
	pub fn reset(&mut self) {
		self.order = Order::empty();
	}

	/// Label of today's date, in the same format as the pickup options.
	pub fn today_label(&self) -> String {
		pickup_label(self.clock.today())
	}

	/// Selectable pickup dates: today and the following days.
	pub fn pickup_options(&self) -> Vec<String> {
		let today = self.clock.today();
		(0..self.pickup_days)
			.filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
			.map(pickup_label)
			.collect()
	}

	fn update_price(&mut self) {
		let mut price =
			self.prices.unit_price(&self.order.flavor) * Decimal::from(self.order.quantity);
		if self.discount_enabled {
			price *= self.prices.discount_multiplier;
		}
		if self.order.pickup_date == self.today_label() {
			price += self.prices.same_day_surcharge;
		}
		self.order.price = price.round_dp(2);
	}
}
