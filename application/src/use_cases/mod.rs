//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod error;
pub mod round_controller;
pub mod session_service;
pub(crate) mod shared;
#[cfg(test)]
pub(crate) mod testing;
