//! Database connectivity for the Vitalis application.
//!
//! The pool is an explicit value constructed at process start and handed to
//! the repository constructors; there is no process-wide singleton. SQLite is
//! the only backend.

mod config;
pub mod migrations;

pub use config::{DatabaseConfig, DatabaseError, DatabasePool};
