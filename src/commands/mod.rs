pub mod general;
pub mod verification;

pub use general::{help, status};
pub use verification::{email, verify};
