use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Number of minor currency units (cents) in one major unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------        Price          ---------------------------------------------------------
/// A price, stored as an integer number of minor currency units. Prices are never stored as floats.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Price(i64);

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl Price {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}
