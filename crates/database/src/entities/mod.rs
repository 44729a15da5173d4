//! Entity definitions shared by every storage backend

pub mod user;

pub use user::{CreateUserRequest, Secret, User, UserId};
