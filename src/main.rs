use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Discord bot for institutional email verification
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Create the registration tables if they don't exist, then start the bot
    #[arg(long)]
    init_schema: bool,

    /// Register slash commands in GUILD_ID instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,
}

mod commands;
mod config;
mod database;
mod error;
mod events;
mod logging;
mod mail;
mod managers;
mod messages;

use commands::{email, help, status, verify};
use config::BotConfig;
use database::{MySqlGateway, SharedGateway};
use events::handle_member_add;
use mail::{SharedMailer, SmtpMailer};
use managers::{
    create_shared_role_manager, create_shared_verification_manager, SharedRoleManager,
    SharedVerificationManager,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub config: Arc<BotConfig>,
    pub verification_manager: SharedVerificationManager,
    pub role_manager: SharedRoleManager,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::GuildMemberAddition { new_member } = event {
        if let Err(e) = handle_member_add(ctx, new_member, data).await {
            error!("Failed to handle new member: {}", e);
        }
    }
    Ok(())
}

/// Log the application ID encoded in the first segment of the token
fn log_bot_id(token: &str) {
    use base64::Engine;

    let Some(bot_id_b64) = token.split('.').next() else {
        return;
    };

    let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(bot_id_b64)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bot_id_b64));

    if let Ok(Ok(id_str)) = decoded.map(String::from_utf8) {
        info!(
            "Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)",
            id_str, id_str
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    logging::init();

    let config = Arc::new(BotConfig::from_env()?);
    info!(
        "Loaded configuration: domain '{}', verified role '{}'",
        config.institution_domain, config.guild.verified_role
    );

    log_bot_id(&config.discord_token);

    let mysql = MySqlGateway::connect_lazy(&config.database);
    if args.init_schema {
        info!("--init-schema: Creating registration tables");
        mysql.ensure_schema().await?;
    }
    let gateway: SharedGateway = Arc::new(mysql);
    let mailer: SharedMailer = Arc::new(SmtpMailer::new(&config.mail)?);

    let verification_manager = create_shared_verification_manager(
        gateway,
        mailer,
        config.institution_domain.clone(),
        config.guild.verified_role.clone(),
    );
    let role_manager = create_shared_role_manager();

    let guild_commands = args.guild_commands;
    let home_guild = config.guild.guild_id;
    if guild_commands {
        match home_guild {
            Some(gid) => info!("--guild-commands: Will register commands in guild {}", gid),
            None => warn!("--guild-commands given but GUILD_ID is not set; registering globally"),
        }
    }

    let setup_config = config.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![status(), email(), verify(), help()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id().map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx
                                .send(poise::CreateReply::default().embed(messages::service_unavailable_embed()))
                                .await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!("Argument parse error in '{}': {} (input: {:?})", ctx.command().qualified_name, error, input);
                            let _ = ctx
                                .say(format!(
                                    "Couldn't read the arguments for `{}`. Try `!help`.",
                                    ctx.command().qualified_name
                                ))
                                .await;
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!("Bot missing permissions for '{}': {:?}", ctx.command().qualified_name, missing_permissions);
                            let _ = ctx.say(format!("Bot is missing permissions: {:?}", missing_permissions)).await;
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                            let _ = ctx.say("This command can only be used in a server.").await;
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let config = setup_config.clone();
            let verification_manager = verification_manager.clone();
            let role_manager = role_manager.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                match (guild_commands, home_guild) {
                    (true, Some(guild_id)) => {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await
                        {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!(
                                "Successfully registered {} commands for guild {}",
                                framework.options().commands.len(),
                                guild_id
                            );
                        }
                    }
                    _ => {
                        info!("Registering commands globally...");
                        if let Err(e) = poise::builtins::register_globally(
                            ctx,
                            &framework.options().commands,
                        )
                        .await
                        {
                            error!("Failed to register commands globally: {}", e);
                        } else {
                            info!(
                                "Successfully registered {} commands globally (may take up to 1 hour to propagate)",
                                framework.options().commands.len()
                            );
                        }
                    }
                }

                if !verification_manager.database_reachable().await {
                    warn!("Database is not reachable yet; commands will report it as unavailable");
                }

                Ok(Data {
                    config,
                    verification_manager,
                    role_manager,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let privileged_intents = ["MESSAGE_CONTENT", "GUILD_MEMBERS"];
    info!("Requesting privileged intents: {:?}", privileged_intents);

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The following privileged intents need to be enabled in the Discord Developer Portal:");
            for intent in &privileged_intents {
                error!("  - {}", intent);
            }
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable these in Discord Developer Portal: {:?}",
                privileged_intents
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
