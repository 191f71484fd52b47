use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::messages::{help_embed, service_unavailable_embed, status_embed};
use crate::{Context, Error};

/// Pick the status reply: the full report when the database answers,
/// otherwise the unavailable notice
fn status_reply(
    database_connected: bool,
    author: &str,
    guild_name: &str,
    guild_id: serenity::GuildId,
) -> serenity::CreateEmbed {
    if database_connected {
        status_embed(author, guild_name, guild_id, true)
    } else {
        service_unavailable_embed()
    }
}

/// Show bot and database status
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    info!("Verifying connection to database...");

    let connected = ctx.data().verification_manager.database_reachable().await;

    if connected {
        info!("Current database status is: {}", connected);
    } else {
        error!(
            "Unable to connect to database. Please verify credentials in environment file are correct"
        );
    }

    let guild_id = ctx.guild_id().ok_or("status can only be used in a server")?;
    let guild_name = ctx
        .partial_guild()
        .await
        .map(|g| g.name)
        .unwrap_or_else(|| guild_id.to_string());

    ctx.send(poise::CreateReply::default().embed(status_reply(
        connected,
        &ctx.author().name,
        &guild_name,
        guild_id,
    )))
    .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let verification_channel = ctx.data().config.guild.verification_channel_id;
    ctx.send(
        poise::CreateReply::default()
            .embed(help_embed(verification_channel))
            .ephemeral(true),
    )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(embed: serenity::CreateEmbed) -> String {
        serde_json::to_value(embed).unwrap()["title"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_status_reply_when_connected() {
        let embed = status_reply(true, "sam", "WGU Cyber Club", serenity::GuildId::new(42));
        assert_eq!(title(embed), "Peregrine Status");
    }

    #[test]
    fn test_status_reply_when_database_down() {
        let embed = status_reply(false, "sam", "WGU Cyber Club", serenity::GuildId::new(42));
        assert_eq!(title(embed), "Service Unavailable");
    }
}
