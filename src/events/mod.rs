pub mod member;

pub use member::handle_member_add;
