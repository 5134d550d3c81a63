pub mod register;
pub mod session;
pub mod types;
pub mod verify;
