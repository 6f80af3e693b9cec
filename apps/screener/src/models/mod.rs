pub mod document;
pub mod session;
pub mod user;
