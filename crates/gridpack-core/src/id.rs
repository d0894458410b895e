//! Stable identifiers for widgets and dashboards.
//!
//! `0` is reserved/invalid so IDs are always non-zero. Identifiers are
//! allocated monotonically by their owner and never reused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors from identifier construction or allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// `0` is not a valid identifier.
    Zero,
    /// Allocation ran past `u64::MAX`.
    Overflow { current: u64 },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "identifier 0 is reserved"),
            Self::Overflow { current } => write!(f, "identifier overflow after {current}"),
        }
    }
}

impl std::error::Error for IdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Lowest valid identifier.
            pub const MIN: Self = Self(1);

            /// Create a new identifier, rejecting 0.
            pub fn new(raw: u64) -> Result<Self, IdError> {
                if raw == 0 {
                    return Err(IdError::Zero);
                }
                Ok(Self(raw))
            }

            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Return the next identifier, or an error on overflow.
            pub fn checked_next(self) -> Result<Self, IdError> {
                let Some(next) = self.0.checked_add(1) else {
                    return Err(IdError::Overflow { current: self.0 });
                };
                Self::new(next)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::MIN
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Process-unique widget identifier, immutable once assigned.
    WidgetId,
    "widget"
);

define_id!(
    /// Identifier of one dashboard grid inside a multi-plane board.
    DashboardId,
    "dashboard"
);
