pub mod postgres_repository;
pub mod tracker;
pub mod user;
