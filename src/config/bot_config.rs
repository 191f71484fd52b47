use poise::serenity_prelude::{ChannelId, GuildId};

use crate::error::{BotError, Result};

/// Runtime configuration, read once at startup and shared with every component
#[derive(Clone)]
pub struct BotConfig {
    /// Discord bot token
    pub discord_token: String,

    pub guild: GuildConfig,

    pub database: DatabaseConfig,

    pub mail: MailConfig,

    /// Required suffix after the `@` of a submitted email (e.g. "wgu.edu")
    pub institution_domain: String,
}

/// Discord-side identifiers and role names
#[derive(Debug, Clone)]
pub struct GuildConfig {
    /// Home guild; slash commands are registered here with `--guild-commands`
    pub guild_id: Option<GuildId>,

    /// Channel for operator-facing notices
    pub log_channel_id: Option<ChannelId>,

    pub verification_channel_id: Option<ChannelId>,

    /// Role granted on successful verification
    pub verified_role: String,

    pub unverified_role: String,
}

/// MySQL connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
}

/// SMTP sender settings
#[derive(Clone)]
pub struct MailConfig {
    /// Address the verification emails are sent from (also the SMTP login)
    pub from_address: String,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

// Credentials stay out of logs.
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("guild", &self.guild)
            .field("database", &self.database)
            .field("mail", &self.mail)
            .field("institution_domain", &self.institution_domain)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("from_address", &self.from_address)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let guild = GuildConfig {
            guild_id: vars.optional_id("GUILD_ID")?.map(GuildId::new),
            log_channel_id: vars.optional_id("LOG_CHANNEL_ID")?.map(ChannelId::new),
            verification_channel_id: vars
                .optional_id("VERIFICATION_CHANNEL_ID")?
                .map(ChannelId::new),
            verified_role: vars.or_default("VERIFIED_ROLE_NAME", "Verified"),
            unverified_role: vars.or_default("UNVERIFIED_ROLE_NAME", "Unverified"),
        };

        let database = DatabaseConfig {
            host: vars.required("DATABASE_HOST")?,
            port: vars.port("DATABASE_PORT", 3306)?,
            username: vars.required("DATABASE_USERNAME")?,
            password: vars.required("DATABASE_PASSWORD")?,
            name: vars.required("DATABASE_NAME")?,
        };

        let mail = MailConfig {
            from_address: vars.required("BOT_EMAIL_ADDRESS")?,
            password: vars.required("BOT_EMAIL_PASSWORD")?,
            smtp_host: vars.or_default("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: vars.port("SMTP_PORT", 587)?,
        };

        let institution_domain = vars
            .or_default("INSTITUTION_DOMAIN", "wgu.edu")
            .trim_start_matches('@')
            .to_ascii_lowercase();

        Ok(Self {
            discord_token: vars.required("DISCORD_TOKEN")?,
            guild,
            database,
            mail,
            institution_domain,
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| BotError::ConfigMissing {
            key: key.to_string(),
        })
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn optional_id(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => Err(BotError::ConfigValidation {
                    key: key.to_string(),
                    message: "snowflake id cannot be 0".to_string(),
                }),
                Ok(id) => Ok(Some(id)),
                Err(e) => Err(BotError::ConfigValidation {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }

    fn port(&self, key: &str, default: u16) -> Result<u16> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                BotError::ConfigValidation {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DISCORD_TOKEN", "token"),
            ("DATABASE_HOST", "127.0.0.1"),
            ("DATABASE_USERNAME", "peregrine"),
            ("DATABASE_PASSWORD", "hunter2"),
            ("DATABASE_NAME", "clubs"),
            ("BOT_EMAIL_ADDRESS", "bot@example.com"),
            ("BOT_EMAIL_PASSWORD", "app-password"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<BotConfig> {
        BotConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.institution_domain, "wgu.edu");
        assert_eq!(config.guild.verified_role, "Verified");
        assert_eq!(config.guild.unverified_role, "Unverified");
        assert_eq!(config.guild.guild_id, None);
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_port, 587);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut env = base_env();
        env.remove("DISCORD_TOKEN");

        match load(&env) {
            Err(BotError::ConfigMissing { key }) => assert_eq!(key, "DISCORD_TOKEN"),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_database_credentials_is_fatal() {
        let mut env = base_env();
        env.insert("DATABASE_PASSWORD", "   ");

        assert!(matches!(
            load(&env),
            Err(BotError::ConfigMissing { key }) if key == "DATABASE_PASSWORD"
        ));
    }

    #[test]
    fn test_ids_and_overrides() {
        let mut env = base_env();
        env.insert("GUILD_ID", "123456789012345678");
        env.insert("LOG_CHANNEL_ID", "42");
        env.insert("INSTITUTION_DOMAIN", "@WGU.EDU");
        env.insert("DATABASE_PORT", "3307");

        let config = load(&env).unwrap();
        assert_eq!(
            config.guild.guild_id,
            Some(GuildId::new(123456789012345678))
        );
        assert_eq!(config.guild.log_channel_id, Some(ChannelId::new(42)));
        assert_eq!(config.institution_domain, "wgu.edu");
        assert_eq!(config.database.port, 3307);
    }

    #[test]
    fn test_invalid_id_rejected() {
        let mut env = base_env();
        env.insert("GUILD_ID", "not-a-number");
        assert!(matches!(
            load(&env),
            Err(BotError::ConfigValidation { key, .. }) if key == "GUILD_ID"
        ));

        env.insert("GUILD_ID", "0");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = load(&base_env()).unwrap();
        let rendered = format!("{:?}", config.database);
        assert!(!rendered.contains("hunter2"));
        let rendered = format!("{:?}", config.mail);
        assert!(!rendered.contains("app-password"));
    }
}
