//! jsv-util - JSON value utilities shared by the jsv crates.

pub mod json_equal;
pub mod number;

pub use json_equal::{deep_equal, deep_equal_with, ArrayEquality, EqualityOptions, NullEquality};
pub use number::{is_integer, is_multiple_of, number_cmp, number_equal, Decimal};
