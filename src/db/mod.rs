//! Database access layer.
//!
//! This module provides database access functionality:
//! - Per-request connections with scoped release
//! - Parameterized statements over the `imoveis` table
//! - Backend dispatch macros shared by MySQL and SQLite

#[macro_use]
pub mod macros;
pub mod provider;
pub mod repository;

pub use provider::{BackendOptions, ConnectionGuard, ConnectionProvider, DatabaseType, DbConnection};
pub use repository::{BindValue, PropertyFilter};
