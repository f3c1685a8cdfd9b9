pub mod chat;
pub mod doctor;
pub mod health;
pub mod probe;
pub mod session;
