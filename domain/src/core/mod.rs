//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: session codes, story and user identifiers
//! - [`error::DomainError`]: domain-level errors
//! - [`time`]: wall-clock helpers used for entity timestamps

pub mod error;
pub mod ids;
pub mod time;
