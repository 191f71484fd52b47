//! Verification code generation

use rand::Rng;

/// Number of digits in a verification pin
pub const PIN_LENGTH: usize = 6;

/// Generate a zero-padded numeric pin, e.g. `"042917"`
pub fn generate_pin() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..10u32.pow(PIN_LENGTH as u32));
    format!("{:0width$}", value, width = PIN_LENGTH)
}

/// Exact comparison of a submitted code against the stored pin.
/// Whitespace around the submission is ignored.
pub fn pin_matches(stored: &str, submitted: &str) -> bool {
    stored == submitted.trim()
}
