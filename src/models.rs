pub mod pagination;
pub mod tracker;
pub mod user;
