pub mod error;
pub mod health;
pub mod tracker;
pub mod user;
