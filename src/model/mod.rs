pub mod client_message;
pub mod question;
pub mod result;
pub mod roster;
pub mod server_message;
pub mod session;
