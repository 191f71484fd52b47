//! In-memory gateway used by the workflow tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::models::{PendingRegistration, VerifiedMember};
use super::pin::{generate_pin, pin_matches};
use super::Gateway;
use crate::error::{BotError, Result};

#[derive(Default)]
struct Tables {
    /// Discord ID -> pending record
    pending: HashMap<u64, PendingRegistration>,
    verified: Vec<VerifiedMember>,
}

pub struct MemoryGateway {
    tables: RwLock<Tables>,
    reachable: AtomicBool,
    /// Pin handed out by `create_registration` instead of a random one
    fixed_pin: Option<String>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            reachable: AtomicBool::new(true),
            fixed_pin: None,
        }
    }

    pub fn with_fixed_pin(pin: &str) -> Self {
        Self {
            fixed_pin: Some(pin.to_string()),
            ..Self::new()
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub async fn pending(&self, user_id: u64) -> Option<PendingRegistration> {
        self.tables.read().await.pending.get(&user_id).cloned()
    }

    pub async fn pending_count(&self) -> usize {
        self.tables.read().await.pending.len()
    }

    pub async fn verified(&self) -> Vec<VerifiedMember> {
        self.tables.read().await.verified.clone()
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BotError::Database {
                source: sqlx::Error::PoolTimedOut,
            })
        }
    }
}

/// MySQL's default collation compares emails case-insensitively
fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn record_exists(&self, email: &str) -> Result<bool> {
        self.ensure_reachable()?;
        let tables = self.tables.read().await;
        Ok(tables.pending.values().any(|p| same_email(&p.email, email))
            || tables.verified.iter().any(|v| same_email(&v.email, email)))
    }

    async fn create_registration(
        &self,
        email: &str,
        display_name: &str,
        user_id: u64,
    ) -> Result<PendingRegistration> {
        self.ensure_reachable()?;
        let mut tables = self.tables.write().await;

        if tables
            .pending
            .values()
            .any(|p| same_email(&p.email, email) && p.discord_user_id != user_id)
        {
            return Err(BotError::AlreadyRegistered {
                email: email.to_string(),
            });
        }

        let pending = PendingRegistration {
            discord_user_id: user_id,
            display_name: display_name.to_string(),
            email: email.to_string(),
            pin: self.fixed_pin.clone().unwrap_or_else(generate_pin),
            created_at: Utc::now(),
        };
        tables.pending.insert(user_id, pending.clone());
        Ok(pending)
    }

    async fn check_pin(&self, user_id: u64, submitted_pin: &str) -> Result<bool> {
        self.ensure_reachable()?;
        let tables = self.tables.read().await;
        Ok(tables
            .pending
            .get(&user_id)
            .map(|p| pin_matches(&p.pin, submitted_pin))
            .unwrap_or(false))
    }

    async fn promote_to_verified(&self, user_id: u64) -> Result<VerifiedMember> {
        self.ensure_reachable()?;
        let mut tables = self.tables.write().await;

        let pending = tables
            .pending
            .get(&user_id)
            .cloned()
            .ok_or(BotError::RegistrationNotFound { user_id })?;

        if tables
            .verified
            .iter()
            .any(|v| same_email(&v.email, &pending.email))
        {
            return Err(BotError::AlreadyRegistered {
                email: pending.email,
            });
        }

        let verified = VerifiedMember::from_pending(&pending, Utc::now());
        tables.pending.remove(&user_id);
        tables.verified.push(verified.clone());
        Ok(verified)
    }

    async fn discard_registration(&self, user_id: u64) -> Result<()> {
        self.ensure_reachable()?;
        self.tables.write().await.pending.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_replaces_own_pending() {
        let gateway = MemoryGateway::with_fixed_pin("123456");

        gateway
            .create_registration("old@wgu.edu", "sam", 1)
            .await
            .unwrap();
        gateway
            .create_registration("new@wgu.edu", "sam", 1)
            .await
            .unwrap();

        assert_eq!(gateway.pending_count().await, 1);
        assert!(!gateway.record_exists("old@wgu.edu").await.unwrap());
        assert!(gateway.record_exists("new@wgu.edu").await.unwrap());
    }

    #[tokio::test]
    async fn test_email_unique_across_users() {
        let gateway = MemoryGateway::new();

        gateway
            .create_registration("student@wgu.edu", "sam", 1)
            .await
            .unwrap();
        let err = gateway
            .create_registration("student@wgu.edu", "alex", 2)
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::AlreadyRegistered { .. }));

        let err = gateway
            .create_registration("STUDENT@wgu.edu", "alex", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::AlreadyRegistered { .. }));
        assert!(gateway.record_exists("Student@WGU.EDU").await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_consumes_pending() {
        let gateway = MemoryGateway::with_fixed_pin("123456");
        gateway
            .create_registration("student@wgu.edu", "sam", 1)
            .await
            .unwrap();

        let verified = gateway.promote_to_verified(1).await.unwrap();
        assert_eq!(verified.email, "student@wgu.edu");
        assert!(gateway.pending(1).await.is_none());
        assert!(!gateway.check_pin(1, "123456").await.unwrap());
        assert!(gateway.record_exists("student@wgu.edu").await.unwrap());

        let err = gateway.promote_to_verified(1).await.unwrap_err();
        assert!(matches!(err, BotError::RegistrationNotFound { user_id: 1 }));
    }

    #[tokio::test]
    async fn test_unreachable_is_an_error_not_a_miss() {
        let gateway = MemoryGateway::new();
        gateway.set_reachable(false);

        assert!(!gateway.is_reachable().await);
        let err = gateway.record_exists("student@wgu.edu").await.unwrap_err();
        assert!(matches!(err, BotError::Database { .. }));
    }
}
