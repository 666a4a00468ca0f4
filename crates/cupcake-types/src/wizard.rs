//! Wizard step enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The screens of the order wizard.
///
/// `Start`, `Flavor`, `Pickup` and `Summary` form the linear submission path.
/// `History` is a side branch entered from `Start` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
	Start,
	Flavor,
	Pickup,
	Summary,
	History,
}

impl WizardStep {
	/// Screen title shown for the step.
	pub fn title(&self) -> &'static str {
		match self {
			WizardStep::Start => "Cupcake",
			WizardStep::Flavor => "Choose Flavor",
			WizardStep::Pickup => "Choose Pickup Date",
			WizardStep::Summary => "Order Summary",
			WizardStep::History => "Order History",
		}
	}

	/// The step reached by going back one screen, if any.
	pub fn previous(&self) -> Option<WizardStep> {
		match self {
			WizardStep::Start => None,
			WizardStep::Flavor => Some(WizardStep::Start),
			WizardStep::Pickup => Some(WizardStep::Flavor),
			WizardStep::Summary => Some(WizardStep::Pickup),
			WizardStep::History => Some(WizardStep::Start),
		}
	}

	/// True for the steps where an order is being configured.
	pub fn is_ordering(&self) -> bool {
		matches!(
			self,
			WizardStep::Flavor | WizardStep::Pickup | WizardStep::Summary
		)
	}
}

impl fmt::Display for WizardStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			WizardStep::Start => "Start",
			WizardStep::Flavor => "Flavor",
			WizardStep::Pickup => "Pickup",
			WizardStep::Summary => "Summary",
			WizardStep::History => "History",
		};
		f.write_str(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_previous_follows_forward_path() {
		assert_eq!(WizardStep::Start.previous(), None);
		assert_eq!(WizardStep::Flavor.previous(), Some(WizardStep::Start));
		assert_eq!(WizardStep::Pickup.previous(), Some(WizardStep::Flavor));
		assert_eq!(WizardStep::Summary.previous(), Some(WizardStep::Pickup));
		assert_eq!(WizardStep::History.previous(), Some(WizardStep::Start));
	}

	#[test]
	fn test_is_ordering() {
		assert!(!WizardStep::Start.is_ordering());
		assert!(WizardStep::Flavor.is_ordering());
		assert!(WizardStep::Summary.is_ordering());
		assert!(!WizardStep::History.is_ordering());
	}
}
