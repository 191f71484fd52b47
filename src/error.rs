use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Missing required environment variable '{key}'")]
    ConfigMissing { key: String },

    #[error("Invalid config value for '{key}': {message}")]
    ConfigValidation { key: String, message: String },

    // Storage errors
    #[error("Database error: {source}")]
    Database {
        #[source]
        source: sqlx::Error,
    },

    // Verification errors
    #[error("Email already registered: {email}")]
    AlreadyRegistered { email: String },

    #[error("No pending registration for user: {user_id}")]
    RegistrationNotFound { user_id: u64 },

    // Mail errors
    #[error("Mail error: {message}")]
    Mail { message: String },

    // Discord errors
    #[error("Discord API error: {message}")]
    Discord { message: String },

    #[error("Role not found: {name}")]
    RoleNotFound { name: String },
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Database { source: err }
    }
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord {
            message: err.to_string(),
        }
    }
}

impl From<lettre::transport::smtp::Error> for BotError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        BotError::Mail {
            message: err.to_string(),
        }
    }
}

impl From<lettre::error::Error> for BotError {
    fn from(err: lettre::error::Error) -> Self {
        BotError::Mail {
            message: err.to_string(),
        }
    }
}

impl From<lettre::address::AddressError> for BotError {
    fn from(err: lettre::address::AddressError) -> Self {
        BotError::Mail {
            message: format!("invalid address: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BotError::ConfigMissing {
            key: "DISCORD_TOKEN".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required environment variable 'DISCORD_TOKEN'"
        );

        let err = BotError::RegistrationNotFound { user_id: 42 };
        assert_eq!(err.to_string(), "No pending registration for user: 42");
    }

    #[test]
    fn test_sqlx_errors_map_to_database() {
        let err: BotError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, BotError::Database { .. }));
        assert!(err.to_string().starts_with("Database error:"));
    }
}
