use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;

use crate::error::Result;

pub const VERIFICATION_SUBJECT: &str = "Verification code";

/// Plain-text body of the verification email
pub fn verification_body(pin: &str) -> String {
    format!(
        "Hello,\n\n\
        Someone (hopefully you) asked to verify this email address on the club Discord server.\n\n\
        Your verification code is: {}\n\n\
        To finish, run this command in the verification channel:\n\n\
        \x20   !verify {} @yourself\n\n\
        If you did not request this, you can ignore this email.\n",
        pin, pin
    )
}

/// Build the verification message from the bot address to `to`
pub fn build_verification_email(from: &str, to: &str, pin: &str) -> Result<Message> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = to.parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(VERIFICATION_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(verification_body(pin))?;

    Ok(message)
}
