pub mod open;
pub mod session;
