//! Fixed-width bitmask sets over calendar units.

use serde::{Deserialize, Serialize};

macro_rules! unit_set {
    ($(#[$meta:meta])* $name:ident, $bits:ty, $min:expr, $max:expr, $shift:expr) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($bits);

        impl $name {
            pub const MIN: u8 = $min;
            pub const MAX: u8 = $max;

            pub fn from_bits(bits: $bits) -> Self {
                Self(bits & Self::valid_bits())
            }

            pub fn bits(&self) -> $bits {
                self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            pub fn is_valid(value: u8) -> bool {
                (Self::MIN..=Self::MAX).contains(&value)
            }

            /// Returns false and leaves the set unchanged for out-of-range values.
            pub fn insert(&mut self, value: u8) -> bool {
                match Self::bit(value) {
                    Some(bit) => {
                        self.0 |= bit;
                        true
                    }
                    None => false,
                }
            }

            pub fn remove(&mut self, value: u8) -> bool {
                match Self::bit(value) {
                    Some(bit) => {
                        self.0 &= !bit;
                        true
                    }
                    None => false,
                }
            }

            pub fn contains(&self, value: u8) -> bool {
                Self::bit(value).is_some_and(|bit| self.0 & bit != 0)
            }

            /// Members in ascending order.
            pub fn values(&self) -> Vec<u8> {
                (Self::MIN..=Self::MAX)
                    .filter(|value| self.contains(*value))
                    .collect()
            }

            fn bit(value: u8) -> Option<$bits> {
                if Self::is_valid(value) {
                    Some(1 << (value - $shift))
                } else {
                    None
                }
            }

            fn valid_bits() -> $bits {
                (Self::MIN..=Self::MAX).fold(0, |acc, value| acc | (1 << (value - $shift)))
            }
        }
    };
}

unit_set!(
    /// Monday = 1 .. Sunday = 7, stored at bit `day - 1`.
    WeekdaySet, u8, 1, 7, 1
);

unit_set!(
    /// January = 1 .. December = 12, stored at bit `month`.
    MonthSet, u16, 1, 12, 0
);

unit_set!(
    /// Days 1..=31, stored at bit `day`.
    DaySet, u32, 1, 31, 0
);
