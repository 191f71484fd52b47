use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::database::{SharedGateway, VerifiedMember};
use crate::error::{BotError, Result};
use crate::mail::SharedMailer;

/// The user who issued a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub user_id: u64,
    pub display_name: String,
}

/// Result of the email-collection step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    /// Address is not under the institutional domain
    InvalidEmail,
    /// Address already held by a pending or verified record
    AlreadyRegistered,
    /// Pending record stored and code emailed
    EmailSent,
    DatabaseUnavailable,
    /// Code could not be emailed; the pending record was rolled back
    MailUnavailable,
}

/// Result of a code submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// No pending record for the invoker, or the pin differs
    InvalidCode,
    Verified(VerifiedMember),
    /// Record promoted but the role could not be assigned
    RoleGrantFailed(VerifiedMember),
    /// Another member verified the same address first; the pending record was dropped
    AlreadyRegistered { email: String },
    DatabaseUnavailable,
}

/// Grants a named role to a guild member
#[async_trait]
pub trait RoleGranter: Send + Sync {
    async fn grant_role(&self, member_id: u64, role_name: &str) -> Result<()>;
}

/// Check that `email` is `local@domain` with a non-empty local part and the
/// institutional domain (compared case-insensitively)
pub fn is_institutional_email(email: &str, domain: &str) -> bool {
    match email.trim().rsplit_once('@') {
        Some((local, host)) => !local.is_empty() && host.eq_ignore_ascii_case(domain),
        None => false,
    }
}

/// Drives a user from unregistered to pending to verified.
/// All state lives behind the gateway.
pub struct VerificationManager {
    gateway: SharedGateway,
    mailer: SharedMailer,
    institution_domain: String,
    verified_role: String,
}

impl VerificationManager {
    pub fn new(
        gateway: SharedGateway,
        mailer: SharedMailer,
        institution_domain: impl Into<String>,
        verified_role: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            mailer,
            institution_domain: institution_domain.into(),
            verified_role: verified_role.into(),
        }
    }

    pub fn institution_domain(&self) -> &str {
        &self.institution_domain
    }

    pub fn verified_role(&self) -> &str {
        &self.verified_role
    }

    /// Connectivity probe for the status command
    pub async fn database_reachable(&self) -> bool {
        self.gateway.is_reachable().await
    }

    /// Unregistered -> Pending
    pub async fn register_email(&self, invoker: &Invoker, email: &str) -> EmailOutcome {
        let email = email.trim();

        if !is_institutional_email(email, &self.institution_domain) {
            debug!("Rejected email '{}' from user {}", email, invoker.user_id);
            return EmailOutcome::InvalidEmail;
        }

        match self.gateway.record_exists(email).await {
            Ok(true) => return EmailOutcome::AlreadyRegistered,
            Ok(false) => {}
            Err(e) => {
                log_database_failure("check existing records", &e);
                return EmailOutcome::DatabaseUnavailable;
            }
        }

        let pending = match self
            .gateway
            .create_registration(email, &invoker.display_name, invoker.user_id)
            .await
        {
            Ok(pending) => pending,
            // Lost a race with a concurrent registration of the same address
            Err(BotError::AlreadyRegistered { .. }) => return EmailOutcome::AlreadyRegistered,
            Err(e) => {
                log_database_failure("create registration", &e);
                return EmailOutcome::DatabaseUnavailable;
            }
        };

        if let Err(e) = self
            .mailer
            .send_verification_code(&pending.email, &pending.pin)
            .await
        {
            error!(
                "Failed to send verification email to {} for user {}: {}",
                pending.email, invoker.user_id, e
            );
            if let Err(e) = self.gateway.discard_registration(invoker.user_id).await {
                error!(
                    "Failed to roll back pending registration for user {}: {}",
                    invoker.user_id, e
                );
            }
            return EmailOutcome::MailUnavailable;
        }

        info!(
            "User {} ({}) registered {} and was sent a code",
            invoker.display_name, invoker.user_id, pending.email
        );
        EmailOutcome::EmailSent
    }

    /// Pending -> Verified
    ///
    /// The pin is checked against the invoker's record while the role goes
    /// to `target_id`; the two are not required to match.
    pub async fn submit_code(
        &self,
        invoker: &Invoker,
        submitted_code: &str,
        target_id: u64,
        roles: &dyn RoleGranter,
    ) -> CodeOutcome {
        debug!(
            "User {} submitted pin '{}'",
            invoker.user_id, submitted_code
        );

        match self.gateway.check_pin(invoker.user_id, submitted_code).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Invalid verification code from user {}", invoker.user_id);
                return CodeOutcome::InvalidCode;
            }
            Err(e) => {
                log_database_failure("check verification pin", &e);
                return CodeOutcome::DatabaseUnavailable;
            }
        }

        let verified = match self.gateway.promote_to_verified(invoker.user_id).await {
            Ok(verified) => verified,
            // Consumed by a concurrent submission
            Err(BotError::RegistrationNotFound { .. }) => return CodeOutcome::InvalidCode,
            Err(BotError::AlreadyRegistered { email }) => {
                warn!(
                    "User {} tried to verify {}, which is already verified by another member",
                    invoker.user_id, email
                );
                if let Err(e) = self.gateway.discard_registration(invoker.user_id).await {
                    log_database_failure("discard conflicting registration", &e);
                }
                return CodeOutcome::AlreadyRegistered { email };
            }
            Err(e) => {
                log_database_failure("promote to verified", &e);
                return CodeOutcome::DatabaseUnavailable;
            }
        };

        if target_id != invoker.user_id {
            warn!(
                "User {} verified with their own code but the '{}' role goes to member {}",
                invoker.user_id, self.verified_role, target_id
            );
        }

        if let Err(e) = roles.grant_role(target_id, &self.verified_role).await {
            error!(
                "Failed to grant '{}' to member {}: {}",
                self.verified_role, target_id, e
            );
            return CodeOutcome::RoleGrantFailed(verified);
        }

        info!(
            "User {} ({}) verified as {} at {}",
            verified.display_name, invoker.user_id, verified.email, verified.verified_at
        );
        CodeOutcome::Verified(verified)
    }
}

fn log_database_failure(operation: &str, e: &BotError) {
    error!("Database unavailable during '{}': {}", operation, e);
}

/// Shared verification manager type
pub type SharedVerificationManager = Arc<VerificationManager>;

pub fn create_shared_verification_manager(
    gateway: SharedGateway,
    mailer: SharedMailer,
    institution_domain: impl Into<String>,
    verified_role: impl Into<String>,
) -> SharedVerificationManager {
    Arc::new(VerificationManager::new(
        gateway,
        mailer,
        institution_domain,
        verified_role,
    ))
}
