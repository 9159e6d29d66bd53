mod price;

pub mod helpers;

pub use helpers::parse_boolean_flag;
pub use price::{Price, MINOR_UNITS_PER_MAJOR};
