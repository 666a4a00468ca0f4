//! String formatting utilities.
//!
//! Provides functions for formatting values for display and for keeping
//! opaque identifiers short in logs.

use rust_decimal::Decimal;

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Formats a price as a currency amount with two decimals, e.g. "$12.00".
pub fn format_price(price: Decimal) -> String {
	format!("${:.2}", price.round_dp(2))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
	}

	#[test]
	fn test_format_price() {
		assert_eq!(format_price(Decimal::new(12, 0)), "$12.00");
		assert_eq!(format_price(Decimal::new(1080, 2)), "$10.80");
		assert_eq!(format_price(Decimal::ZERO), "$0.00");
	}
}
