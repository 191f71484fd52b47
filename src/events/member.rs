use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use crate::messages::{nickname_failed_message, unverified_nickname};
use crate::{Data, Error};

/// Handle when a new member joins the guild
///
/// Gives the member the unverified role and tags their nickname. A failed
/// nickname change is reported in the log channel.
pub async fn handle_member_add(
    ctx: &serenity::Context,
    new_member: &serenity::Member,
    data: &Data,
) -> Result<(), Error> {
    let guild_id = new_member.guild_id;

    if let Some(home_guild) = data.config.guild.guild_id {
        if home_guild != guild_id {
            return Ok(());
        }
    }

    info!(
        "New member joined: {} in guild {}",
        new_member.user.name, guild_id
    );

    let unverified_role = &data.config.guild.unverified_role;
    if let Err(e) = data
        .role_manager
        .assign_role_to_user(&ctx.http, guild_id, new_member.user.id, unverified_role)
        .await
    {
        warn!(
            "Failed to assign '{}' to new member {}: {}",
            unverified_role, new_member.user.id, e
        );
    }

    let nickname = unverified_nickname(&new_member.user.name);
    if let Err(e) = guild_id
        .edit_member(
            &ctx.http,
            new_member.user.id,
            serenity::EditMember::new().nickname(nickname),
        )
        .await
    {
        error!(
            "Failed to set nickname for {} in guild {}: {}. Bot requires 'Manage Nicknames' permission and must have a higher role than the target user.",
            new_member.user.id, guild_id, e
        );

        if let Some(log_channel) = data.config.guild.log_channel_id {
            log_channel
                .say(&ctx.http, nickname_failed_message(&new_member.user.name))
                .await?;
        }
    }

    Ok(())
}
