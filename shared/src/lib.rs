//! Shared types and models for the Procurement Fulfillment Platform
//!
//! This crate contains the domain entities, status state machines, and the
//! pure classification/aggregation logic shared between the backend and
//! other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
