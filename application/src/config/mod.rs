//! Application-level configuration.
//!
//! - [`RoundParams`]: timeouts for store calls and session critical sections

pub mod round_params;

pub use round_params::RoundParams;
