//! # User Directory Users Crate
//!
//! The directory contract and the service built on it. The service is handed
//! one adapter at construction and never reaches for an ambient pool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use userdir_users::{CreateUserRequest, UserService};
//!
//! let storage = userdir_database::initialize_storage(&config.database).await?;
//! let service = UserService::new(storage);
//! let user = service.create_user(request).await?;
//! ```

pub mod services;
pub mod types;

pub use userdir_database::{CreateUserRequest, Secret, User, UserError, UserId, UserStorage};

pub use services::{MockUserRepository, UserRepo, UserService};
pub use types::{DirectoryError, DirectoryResult};
