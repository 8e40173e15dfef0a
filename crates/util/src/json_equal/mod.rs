//! JSON equality utilities.
//!
//! Provides deep equality comparison of JSON values with configurable
//! array and null policies.

mod deep_equal;

pub use deep_equal::{deep_equal, deep_equal_with, ArrayEquality, EqualityOptions, NullEquality};
