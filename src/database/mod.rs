//! Data-access boundary between the verification workflow and the store
//!
//! The workflow only talks to the [`Gateway`] trait. Production uses
//! [`MySqlGateway`]; tests run against an in-memory implementation.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod mysql;
pub mod pin;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

pub use models::{PendingRegistration, VerifiedMember};
pub use mysql::MySqlGateway;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Connectivity probe, separate from any query outcome
    async fn is_reachable(&self) -> bool;

    /// True if `email` is held by a pending or a verified record
    async fn record_exists(&self, email: &str) -> Result<bool>;

    /// Store a pending registration with a freshly generated pin.
    /// An earlier pending record of the same user is replaced.
    async fn create_registration(
        &self,
        email: &str,
        display_name: &str,
        user_id: u64,
    ) -> Result<PendingRegistration>;

    /// True iff `user_id` has a pending record whose pin equals `submitted_pin`
    async fn check_pin(&self, user_id: u64, submitted_pin: &str) -> Result<bool>;

    /// Move the user's pending record into verified storage
    async fn promote_to_verified(&self, user_id: u64) -> Result<VerifiedMember>;

    /// Drop the user's pending record, if any
    async fn discard_registration(&self, user_id: u64) -> Result<()>;
}

/// Shared gateway type
pub type SharedGateway = Arc<dyn Gateway>;
