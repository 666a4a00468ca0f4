//! Core of the cupcake shop.
//!
//! Holds the order wizard and the order state it drives, the engine that
//! owns the shop's services for one running process, and the builder that
//! assembles that engine from configuration and factory maps.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod state;

pub use builder::{BuilderError, ShopBuilder, ShopFactories};
pub use engine::{EngineError, ShopEngine};
pub use handlers::{AnalyticsCounters, AnalyticsHandler, PushTokenRegistrar};
pub use state::{
	OrderState, OrderWizard, PriceTable, SubmitError, Submission, WizardError,
	OUT_OF_STOCK_FLAVOR,
};
