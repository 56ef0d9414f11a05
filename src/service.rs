pub mod tracker;
pub mod user;
