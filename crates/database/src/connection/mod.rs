//! Connection providers, one per storage engine.
//!
//! Each provider is built once at startup, pings the engine before it is
//! handed out, and is closed explicitly at shutdown.

mod mongo;
mod mysql;
mod postgres;

pub use mongo::MongoProvider;
pub use mysql::MySqlProvider;
pub use postgres::PostgresProvider;
