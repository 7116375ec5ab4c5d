//! Storage adapters for the account ports.
//!
//! [`postgres`] is used in production. [`memory`] backs tests and
//! deployments without a `postgres` section.

pub mod memory;
pub mod postgres;
