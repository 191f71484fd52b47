use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A registration waiting for its pin to be confirmed
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingRegistration {
    /// Discord user ID (snowflake); one pending record per user
    pub discord_user_id: u64,

    /// Discord name at the time the email was submitted
    pub display_name: String,

    /// Institutional email address
    pub email: String,

    /// Six-digit verification code sent to `email`
    pub pin: String,

    pub created_at: DateTime<Utc>,
}

/// A member whose institutional email has been confirmed
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct VerifiedMember {
    pub discord_user_id: u64,
    pub display_name: String,
    pub email: String,
    pub verified_at: DateTime<Utc>,
}

impl VerifiedMember {
    /// Promote a pending registration
    pub fn from_pending(pending: &PendingRegistration, verified_at: DateTime<Utc>) -> Self {
        Self {
            discord_user_id: pending.discord_user_id,
            display_name: pending.display_name.clone(),
            email: pending.email.clone(),
            verified_at,
        }
    }
}
