//! Line item quantity.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::coerce::to_number;

/// A line item quantity: always an integer `>= 1`.
///
/// Every constructor clamps, so a `Quantity` can never hold zero. Untrusted
/// input goes through [`Quantity::coerce`], which floors fractional values and
/// maps non-finite or non-positive values to `1`.
///
/// ## Examples
///
/// ```
/// use dsnh_core::Quantity;
/// use serde_json::json;
///
/// assert_eq!(Quantity::coerce(&json!(2.9)).get(), 2);
/// assert_eq!(Quantity::coerce(&json!(-4)).get(), 1);
/// assert_eq!(Quantity::coerce(&json!("3")).get(), 3);
/// assert_eq!(Quantity::coerce(&json!("lots")).get(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Create a quantity, clamping `0` up to `1`.
    #[must_use]
    pub const fn new(qty: u32) -> Self {
        if qty == 0 { Self::ONE } else { Self(qty) }
    }

    /// Clamp an arbitrary float into a quantity.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above the cast
    pub fn from_f64(n: f64) -> Self {
        if !n.is_finite() {
            return Self::ONE;
        }
        let floored = n.floor();
        if floored < 1.0 {
            Self::ONE
        } else if floored >= f64::from(u32::MAX) {
            Self(u32::MAX)
        } else {
            Self(floored as u32)
        }
    }

    /// Coerce an untrusted JSON value (number, numeric string, ...) into a
    /// quantity.
    #[must_use]
    pub fn coerce(value: &Value) -> Self {
        Self::from_f64(to_number(value))
    }

    /// Coerce text such as a form field value.
    #[must_use]
    pub fn parse_lossy(text: &str) -> Self {
        Self::coerce(&Value::String(text.to_owned()))
    }

    /// The quantity as an integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Add two quantities, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<u32> for Quantity {
    fn from(qty: u32) -> Self {
        Self::new(qty)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::coerce(&raw))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_clamps_everything_to_positive_integer() {
        for raw in [
            json!(0),
            json!(-3),
            json!(0.4),
            json!(null),
            json!("abc"),
            json!(""),
            json!({}),
            json!([]),
            json!(f64::MAX),
        ] {
            assert!(Quantity::coerce(&raw).get() >= 1, "input {raw}");
        }
    }

    #[test]
    fn test_floors_fractions() {
        assert_eq!(Quantity::coerce(&json!(5.99)).get(), 5);
        assert_eq!(Quantity::parse_lossy(" 7 ").get(), 7);
    }

    #[test]
    fn test_saturating_add() {
        let max = Quantity::new(u32::MAX);
        assert_eq!(max.saturating_add(Quantity::ONE).get(), u32::MAX);
        assert_eq!(Quantity::new(1).saturating_add(Quantity::new(3)).get(), 4);
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let q: Quantity = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(q.get(), 4);
        let q: Quantity = serde_json::from_str("-2").unwrap();
        assert_eq!(q, Quantity::ONE);
    }
}
