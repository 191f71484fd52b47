// src/messages.rs
use poise::serenity_prelude as serenity;

const COLOR_INFO: u32 = 0x3498db;
const COLOR_SUCCESS: u32 = 0x2ecc71;
const COLOR_WARNING: u32 = 0xf1c40f;
const COLOR_ERROR: u32 = 0xe74c3c;

pub fn status_embed(
    author: &str,
    guild_name: &str,
    guild_id: serenity::GuildId,
    database_connected: bool,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Peregrine Status")
        .description(format!("Status requested by **{}**", author))
        .field("Server", guild_name, true)
        .field("Server ID", guild_id.to_string(), true)
        .field(
            "Database connected",
            if database_connected { "✅ true" } else { "❌ false" },
            false,
        )
        .color(if database_connected { COLOR_SUCCESS } else { COLOR_ERROR })
}

pub fn invalid_email_embed(email: &str, domain: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("❌ Invalid Email")
        .description(format!(
            "`{}` is not a valid **@{}** address.\n\n\
            Please run `!email your.name@{}` with your institutional email.",
            email, domain, domain
        ))
        .color(COLOR_ERROR)
}

pub fn already_registered_embed(email: &str, author: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("⚠️ Email Already Registered")
        .description(format!(
            "Sorry **{}**, `{}` is already registered.\n\n\
            If you already received a code, finish with `!verify <code> @yourself`. \
            Otherwise contact an administrator.",
            author, email
        ))
        .color(COLOR_WARNING)
}

pub fn email_sent_embed(email: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("📨 Verification Email Sent")
        .description(format!(
            "A verification code was sent to `{}`.\n\n\
            Check your inbox (and spam folder), then run `!verify <code> @yourself`.",
            email
        ))
        .color(COLOR_INFO)
}

pub fn invalid_code_embed(submitted_code: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("❌ Invalid Code")
        .description(format!(
            "The code `{}` does not match our records.\n\n\
            Double-check the code from your email and try again.",
            submitted_code
        ))
        .color(COLOR_ERROR)
}

pub fn verification_success_embed(author: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("✅ Verification Successful!")
        .description(format!(
            "Welcome, **{}**! Your institutional email has been confirmed \
            and you now have the verified role.",
            author
        ))
        .color(COLOR_SUCCESS)
}

pub fn role_grant_failed_embed(role_name: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("⚠️ Verified, Role Not Assigned")
        .description(format!(
            "Your code was accepted, but I couldn't assign the **{}** role. \
            Please ask an administrator to assign it manually.",
            role_name
        ))
        .color(COLOR_WARNING)
}

/// Shown whenever the database or the mail relay cannot be reached
pub fn service_unavailable_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Service Unavailable")
        .description(
            "I can't reach one of my backend services right now. \
            Please try again later.",
        )
        .color(COLOR_ERROR)
}

pub fn help_embed(verification_channel: Option<serenity::ChannelId>) -> serenity::CreateEmbed {
    let description = match verification_channel {
        Some(channel) => format!("Available commands (verify in <#{}>):", channel),
        None => "Available commands:".to_string(),
    };

    serenity::CreateEmbed::new()
        .title("Bot Commands")
        .description(description)
        .field("!status", "Show bot and database status", false)
        .field("!email <address>", "Start verification with your institutional email", false)
        .field("!verify <code> @member", "Finish verification with the emailed code", false)
        .field("!help", "Show this message", false)
        .color(COLOR_INFO)
}

/// Posted in the log channel when a new member's nickname can't be set
pub fn nickname_failed_message(member_name: &str) -> String {
    format!("Failed to set nickname on new user: {}\n", member_name)
}

pub fn unverified_nickname(member_name: &str) -> String {
    format!("{} | UNVERIFIED", member_name)
}
