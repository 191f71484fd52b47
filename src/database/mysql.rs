use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::models::{PendingRegistration, VerifiedMember};
use super::pin::{generate_pin, pin_matches};
use super::Gateway;
use crate::config::DatabaseConfig;
use crate::error::{BotError, Result};

/// Idempotent schema, applied with `--init-schema`
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS pending_registrations (
        discord_user_id BIGINT UNSIGNED NOT NULL PRIMARY KEY,
        display_name VARCHAR(100) NOT NULL,
        email VARCHAR(254) NOT NULL,
        pin VARCHAR(16) NOT NULL,
        created_at DATETIME NOT NULL,
        UNIQUE KEY uq_pending_email (email)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS verified_members (
        discord_user_id BIGINT UNSIGNED NOT NULL,
        display_name VARCHAR(100) NOT NULL,
        email VARCHAR(254) NOT NULL,
        verified_at DATETIME NOT NULL,
        KEY ix_verified_user (discord_user_id),
        UNIQUE KEY uq_verified_email (email)
    )"#,
];

/// Gateway backed by a MySQL connection pool
pub struct MySqlGateway {
    pool: MySqlPool,
}

impl MySqlGateway {
    /// Build the pool without connecting; the first query opens a connection.
    /// An unreachable server therefore shows up in `is_reachable`, not at startup.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(options);

        Self { pool }
    }

    /// Create the registration tables if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

/// Map a unique-index violation on `email` to the domain error
fn map_duplicate(err: sqlx::Error, email: &str) -> BotError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            BotError::AlreadyRegistered {
                email: email.to_string(),
            }
        }
        _ => err.into(),
    }
}

#[async_trait]
impl Gateway for MySqlGateway {
    async fn is_reachable(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Database probe failed: {}", e);
                false
            }
        }
    }

    async fn record_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT email FROM pending_registrations WHERE email = ? \
             UNION ALL \
             SELECT email FROM verified_members WHERE email = ? \
             LIMIT 1",
        )
        .bind(email)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn create_registration(
        &self,
        email: &str,
        display_name: &str,
        user_id: u64,
    ) -> Result<PendingRegistration> {
        let pending = PendingRegistration {
            discord_user_id: user_id,
            display_name: display_name.to_string(),
            email: email.to_string(),
            pin: generate_pin(),
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pending_registrations WHERE discord_user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO pending_registrations \
             (discord_user_id, display_name, email, pin, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(pending.discord_user_id)
        .bind(&pending.display_name)
        .bind(&pending.email)
        .bind(&pending.pin)
        .bind(pending.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_duplicate(e, email))?;

        tx.commit().await?;

        debug!(
            "Stored pending registration for user {} at {}",
            user_id, pending.created_at
        );
        Ok(pending)
    }

    async fn check_pin(&self, user_id: u64, submitted_pin: &str) -> Result<bool> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT pin FROM pending_registrations WHERE discord_user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(stored
            .map(|pin| pin_matches(&pin, submitted_pin))
            .unwrap_or(false))
    }

    async fn promote_to_verified(&self, user_id: u64) -> Result<VerifiedMember> {
        let mut tx = self.pool.begin().await?;

        let pending: PendingRegistration = sqlx::query_as(
            "SELECT discord_user_id, display_name, email, pin, created_at \
             FROM pending_registrations WHERE discord_user_id = ? FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BotError::RegistrationNotFound { user_id })?;

        let verified = VerifiedMember::from_pending(&pending, Utc::now());

        sqlx::query(
            "INSERT INTO verified_members (discord_user_id, display_name, email, verified_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(verified.discord_user_id)
        .bind(&verified.display_name)
        .bind(&verified.email)
        .bind(verified.verified_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_duplicate(e, &pending.email))?;

        sqlx::query("DELETE FROM pending_registrations WHERE discord_user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Promoted user {} ({}) to verified", user_id, verified.email);
        Ok(verified)
    }

    async fn discard_registration(&self, user_id: u64) -> Result<()> {
        sqlx::query("DELETE FROM pending_registrations WHERE discord_user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
