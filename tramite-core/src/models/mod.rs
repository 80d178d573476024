//! Domain models for TrámiteFácil.
//!
//! # Core Concepts
//!
//! - [`Company`]: The master entity. A user registers one or more companies and
//!   every obligation is scoped to exactly one of them.
//! - [`Obligation`]: The detail entity. A bill or due with a calendar due date,
//!   an optional estimated amount and a [`Frequency`].
//! - [`DashboardSummary`]: Server-computed overview of upcoming and overdue
//!   obligations plus the estimated total for the current month.
//! - [`Session`]: The signed-in user and the bearer token proving it.
//!
//! Field names on the wire are the API's Spanish names (`nombre_comercial`,
//! `fecha_vencimiento`, ...). The Rust names are English and mapped with serde.

mod company;
mod dashboard;
mod obligation;
mod session;

pub use company::*;
pub use dashboard::*;
pub use obligation::*;
pub use session::*;

use serde::{Deserialize, Deserializer};

/// Input rejected before it is ever sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Blank(&'static str),
    #[error("estimated amount cannot be negative")]
    NegativeAmount,
    #[error("frequency '{0}' is not available yet")]
    ReservedFrequency(String),
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank(field))
    } else {
        Ok(())
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
