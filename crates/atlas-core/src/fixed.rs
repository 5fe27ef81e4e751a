//! Integer price and quantity values.
//!
//! The registry never does arithmetic on prices; they are carried as raw
//! `u64` ticks exactly as the intake layer decoded them. Quantities get the
//! few operations needed to apply fills in place.

use core::fmt;

/// Raw price in exchange ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Price(pub u64);

impl Price {
    pub const ZERO: Self = Self(0);

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for Price {
    #[inline(always)]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in base units (shares, contracts, lots).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Self = Self(0);

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    #[inline(always)]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Quantity {
    #[inline(always)]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_is_identity() {
        assert_eq!(Price::from_raw(12_345).as_raw(), 12_345);
        assert_eq!(Price::from(7), Price(7));
        assert_eq!(Quantity::from(9).as_raw(), 9);
    }

    #[test]
    fn test_quantity_saturating_sub() {
        assert_eq!(Quantity(10).saturating_sub(Quantity(4)), Quantity(6));
        assert_eq!(Quantity(10).saturating_sub(Quantity(20)), Quantity::ZERO);
        assert!(Quantity::ZERO.is_zero());
    }
}
