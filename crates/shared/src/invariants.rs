//! Compile-time helpers for carrying validated invariants.

use std::fmt;

/// Proof wrapper indicating a value has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    /// Wrap a validated value.
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Consume and return the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Out-of-range error for bounded numeric wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError<T> {
    /// Raw value provided.
    pub value: T,
    /// Inclusive minimum.
    pub min: T,
    /// Inclusive maximum.
    pub max: T,
}

impl<T: fmt::Display> fmt::Display for BoundsError<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "value {} is outside [{}, {}]",
            self.value, self.min, self.max
        )
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for BoundsError<T> {}

macro_rules! bounded_int {
    ($(#[$meta:meta])* $name:ident, $int:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name<const MIN: $int, const MAX: $int>($int);

        impl<const MIN: $int, const MAX: $int> $name<MIN, MAX> {
            /// Create a bounded value or return a bounds error.
            pub const fn try_new(value: $int) -> Result<Self, BoundsError<$int>> {
                if value < MIN || value > MAX {
                    Err(BoundsError {
                        value,
                        min: MIN,
                        max: MAX,
                    })
                } else {
                    Ok(Self(value))
                }
            }

            /// Return the wrapped value.
            pub const fn get(self) -> $int {
                self.0
            }
        }
    };
}

bounded_int!(
    /// Bounded `u32` with const generic limits.
    BoundedU32,
    u32
);
bounded_int!(
    /// Bounded `u64` with const generic limits.
    BoundedU64,
    u64
);
