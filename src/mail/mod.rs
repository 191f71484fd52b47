//! Outbound email for verification codes
//!
//! The workflow depends on the [`Mailer`] trait only; [`SmtpMailer`] delivers
//! through an authenticated SMTP relay via lettre.

mod message;
mod smtp;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

pub use smtp::SmtpMailer;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the one-time code to `to`. No retry; transport failure is returned.
    async fn send_verification_code(&self, to: &str, pin: &str) -> Result<()>;
}

/// Shared mailer type
pub type SharedMailer = Arc<dyn Mailer>;
