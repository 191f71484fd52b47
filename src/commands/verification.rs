use poise::serenity_prelude as serenity;

use crate::managers::role_manager::GuildRoleGranter;
use crate::managers::verification_manager::{CodeOutcome, EmailOutcome, Invoker};
use crate::messages;
use crate::{Context, Error};

fn invoker(ctx: Context<'_>) -> Invoker {
    Invoker {
        user_id: ctx.author().id.get(),
        display_name: ctx.author().name.clone(),
    }
}

/// Collect your institutional email for verification
///
/// A one-time code is emailed to the address. Finish with `verify`.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn email(
    ctx: Context<'_>,
    #[description = "Your institutional email address"] user_email: String,
) -> Result<(), Error> {
    let verification_manager = &ctx.data().verification_manager;
    let invoker = invoker(ctx);
    let user_email = user_email.trim();

    let embed = match verification_manager
        .register_email(&invoker, user_email)
        .await
    {
        EmailOutcome::InvalidEmail => {
            messages::invalid_email_embed(user_email, verification_manager.institution_domain())
        }
        EmailOutcome::AlreadyRegistered => {
            messages::already_registered_embed(user_email, &invoker.display_name)
        }
        EmailOutcome::EmailSent => messages::email_sent_embed(user_email),
        EmailOutcome::DatabaseUnavailable | EmailOutcome::MailUnavailable => {
            messages::service_unavailable_embed()
        }
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Submit the code from your verification email
///
/// The code is checked against your own pending registration; the verified
/// role is granted to `member`.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn verify(
    ctx: Context<'_>,
    #[description = "Code from your verification email"] submitted_auth_code: String,
    #[description = "Member who receives the verified role"] member: serenity::Member,
) -> Result<(), Error> {
    let verification_manager = &ctx.data().verification_manager;
    let invoker = invoker(ctx);

    let granter = GuildRoleGranter {
        http: ctx.http(),
        guild_id: member.guild_id,
        role_manager: ctx.data().role_manager.as_ref(),
    };

    let embed = match verification_manager
        .submit_code(
            &invoker,
            &submitted_auth_code,
            member.user.id.get(),
            &granter,
        )
        .await
    {
        CodeOutcome::InvalidCode => messages::invalid_code_embed(submitted_auth_code.trim()),
        CodeOutcome::Verified(_) => messages::verification_success_embed(&invoker.display_name),
        CodeOutcome::RoleGrantFailed(_) => {
            messages::role_grant_failed_embed(verification_manager.verified_role())
        }
        CodeOutcome::AlreadyRegistered { email } => {
            messages::already_registered_embed(&email, &invoker.display_name)
        }
        CodeOutcome::DatabaseUnavailable => messages::service_unavailable_embed(),
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
