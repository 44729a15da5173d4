//! Business logic services for the user directory.
//!
//! The service coordinates between the injected user record adapter and the
//! directory's rules: normalization, the uniqueness pre-check, and the
//! mapping of storage faults to directory errors.

pub mod mock_repositories;
pub mod user_service;

pub use mock_repositories::MockUserRepository;
pub use user_service::{UserRepo, UserService};
