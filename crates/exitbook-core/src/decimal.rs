//! Arbitrary-precision decimal math.
//!
//! Every monetary or asset quantity in the core crosses from raw JSON as a
//! string, never a float. `Amount` wraps [`BigDecimal`] and only exposes
//! construction from strings/integers and `BigDecimal` itself; there is no
//! `From<f64>` so a stray `parseFloat`-equivalent cannot sneak into a math
//! path undetected.

use std::{
	fmt,
	ops::{Add, Div, Mul, Sub},
	str::FromStr,
};

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(BigDecimal);

impl Amount {
	pub fn zero() -> Self {
		Self(BigDecimal::from(0))
	}

	pub fn is_zero(&self) -> bool {
		self.0 == BigDecimal::from(0)
	}

    /// Negative-checking accessor used by movement/fee validation.
    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }

	pub fn as_bigdecimal(&self) -> &BigDecimal {
		&self.0
	}

	pub fn from_bigdecimal(value: BigDecimal) -> Self {
		Self(value)
	}

	/// Clamp to the inclusive `[0, 1]` range, used by confidence/similarity scores.
	pub fn clamp_unit(self) -> Self {
		let zero = BigDecimal::from(0);
		let one = BigDecimal::from(1);
		if self.0 < zero {
			Self(zero)
		} else if self.0 > one {
			Self(one)
		} else {
			self
		}
	}
}

impl From<i64> for Amount {
	fn from(value: i64) -> Self {
		Self(BigDecimal::from(value))
	}
}

impl FromStr for Amount {
	type Err = bigdecimal::ParseBigDecimalError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(BigDecimal::from_str(s)?))
	}
}

impl TryFrom<String> for Amount {
	type Error = bigdecimal::ParseBigDecimalError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_str(&value)
	}
}

impl From<Amount> for String {
	fn from(value: Amount) -> Self {
		value.0.to_string()
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Add for Amount {
	type Output = Amount;
	fn add(self, rhs: Self) -> Self::Output {
		Amount(self.0 + rhs.0)
	}
}

impl Sub for Amount {
	type Output = Amount;
	fn sub(self, rhs: Self) -> Self::Output {
		Amount(self.0 - rhs.0)
	}
}

impl Mul for Amount {
	type Output = Amount;
	fn mul(self, rhs: Self) -> Self::Output {
		Amount(self.0 * rhs.0)
	}
}

impl Div for Amount {
	type Output = Amount;
	fn div(self, rhs: Self) -> Self::Output {
		Amount(self.0 / rhs.0)
	}
}

impl<'a> Add<&'a Amount> for &'a Amount {
	type Output = Amount;
	fn add(self, rhs: &'a Amount) -> Self::Output {
		Amount(self.0.clone() + rhs.0.clone())
	}
}

impl<'a> Sub<&'a Amount> for &'a Amount {
	type Output = Amount;
	fn sub(self, rhs: &'a Amount) -> Self::Output {
		Amount(self.0.clone() - rhs.0.clone())
	}
}

impl<'a> Mul<&'a Amount> for &'a Amount {
	type Output = Amount;
	fn mul(self, rhs: &'a Amount) -> Self::Output {
		Amount(self.0.clone() * rhs.0.clone())
	}
}

impl<'a> Div<&'a Amount> for &'a Amount {
	type Output = Amount;
	fn div(self, rhs: &'a Amount) -> Self::Output {
		Amount(self.0.clone() / rhs.0.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_from_string_without_float_roundtrip() {
		let a: Amount = "0.123456789012345678".parse().unwrap();
		let b: Amount = "0.123456789012345678".parse().unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn clamp_unit_bounds_scores() {
		let over: Amount = "1.5".parse().unwrap();
		assert_eq!(over.clamp_unit().to_string(), "1");
		let under: Amount = "-0.2".parse().unwrap();
		assert_eq!(under.clamp_unit().to_string(), "0");
	}
}
