//! State of one customer's ordering session.
//!
//! `OrderState` holds the order being configured and its live price;
//! `OrderWizard` walks the customer through the screens and decides when the
//! order may be submitted.

pub mod order;
pub mod wizard;

pub use order::{OrderState, PriceTable};
pub use wizard::{OrderWizard, SubmitError, Submission, WizardError, OUT_OF_STOCK_FLAVOR};
