use async_trait::async_trait;
use poise::serenity_prelude::{GuildId, Http, RoleId, UserId};
use std::sync::Arc;
use tracing::info;

use crate::error::{BotError, Result};
use crate::managers::verification_manager::RoleGranter;

/// Resolves guild roles by name and assigns them
pub struct RoleManager;

impl RoleManager {
    pub fn new() -> Self {
        Self
    }

    /// Look up a role ID by exact name
    pub async fn get_role_id(
        &self,
        http: &Http,
        guild_id: GuildId,
        role_name: &str,
    ) -> Result<RoleId> {
        let roles = guild_id.roles(http).await?;

        find_role_by_name(roles.iter().map(|(id, role)| (*id, role.name.as_str())), role_name)
            .ok_or_else(|| BotError::RoleNotFound {
                name: role_name.to_string(),
            })
    }

    /// Assign a role to a user
    pub async fn assign_role_to_user(
        &self,
        http: &Http,
        guild_id: GuildId,
        user_id: UserId,
        role_name: &str,
    ) -> Result<()> {
        let role_id = self.get_role_id(http, guild_id, role_name).await?;

        let member = guild_id.member(http, user_id).await?;
        member.add_role(http, role_id).await?;

        info!("Assigned role '{}' to user {}", role_name, user_id);
        Ok(())
    }
}

/// Pick the first role whose name matches exactly
fn find_role_by_name<'a>(
    roles: impl IntoIterator<Item = (RoleId, &'a str)>,
    role_name: &str,
) -> Option<RoleId> {
    roles
        .into_iter()
        .find(|(_, name)| *name == role_name)
        .map(|(id, _)| id)
}

/// Grants roles in one guild on behalf of the verification workflow
pub struct GuildRoleGranter<'a> {
    pub http: &'a Http,
    pub guild_id: GuildId,
    pub role_manager: &'a RoleManager,
}

#[async_trait]
impl<'a> RoleGranter for GuildRoleGranter<'a> {
    async fn grant_role(&self, member_id: u64, role_name: &str) -> Result<()> {
        self.role_manager
            .assign_role_to_user(self.http, self.guild_id, UserId::new(member_id), role_name)
            .await
    }
}

/// Shared role manager type
pub type SharedRoleManager = Arc<RoleManager>;

pub fn create_shared_role_manager() -> SharedRoleManager {
    Arc::new(RoleManager::new())
}
