//! Per-request connection management.
//!
//! Every request opens one fresh connection through the [`ConnectionProvider`]
//! and hands it back through [`ConnectionGuard::release`]. There is no pool.

use crate::config::DatabaseConfig;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Backend-specific connect options, built once at startup.
#[derive(Debug, Clone)]
pub enum BackendOptions {
    MySql(MySqlConnectOptions),
    SQLite(SqliteConnectOptions),
}

impl BackendOptions {
    /// Build connect options from the configuration.
    ///
    /// A `url` wins over the discrete `DB_*` settings. A CA path switches
    /// MySQL to `VERIFY_CA`.
    pub fn from_config(config: &DatabaseConfig) -> ApiResult<Self> {
        let Some(url) = config.url.as_deref() else {
            return Ok(Self::MySql(Self::mysql_options(config)));
        };

        match DatabaseType::from_connection_string(url) {
            Some(DatabaseType::MySQL) => {
                // sqlx only understands the mysql:// scheme
                let normalized = match url.split_once("://") {
                    Some((_, rest)) => format!("mysql://{}", rest),
                    None => url.to_string(),
                };
                let mut options = MySqlConnectOptions::from_str(&normalized)
                    .map_err(|e| {
                        ApiError::connection(format!("Invalid MySQL connection string: {}", e))
                    })?
                    .charset("utf8mb4");
                if let Some(ca) = &config.ssl_ca_path {
                    options = options.ssl_mode(MySqlSslMode::VerifyCa).ssl_ca(ca);
                }
                Ok(Self::MySql(options))
            }
            Some(DatabaseType::SQLite) => {
                let options = SqliteConnectOptions::from_str(url).map_err(|e| {
                    ApiError::connection(format!("Invalid SQLite connection string: {}", e))
                })?;
                Ok(Self::SQLite(options))
            }
            None => Err(ApiError::connection(
                "Unknown database type: the URL must start with mysql://, mariadb:// or sqlite:",
            )),
        }
    }

    fn mysql_options(config: &DatabaseConfig) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .charset("utf8mb4");
        if let Some(ca) = &config.ssl_ca_path {
            options = options.ssl_mode(MySqlSslMode::VerifyCa).ssl_ca(ca);
        }
        options
    }

    pub fn db_type(&self) -> DatabaseType {
        match self {
            Self::MySql(_) => DatabaseType::MySQL,
            Self::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// One open connection to the property store.
#[derive(Debug)]
pub enum DbConnection {
    MySql(MySqlConnection),
    SQLite(SqliteConnection),
}

impl DbConnection {
    pub fn db_type(&self) -> DatabaseType {
        impl_db_dispatch!(self, {
            MySql(_c) => DatabaseType::MySQL,
            SQLite(_c) => DatabaseType::SQLite,
        })
    }

    /// Close the connection, telling the server we are leaving.
    pub async fn close(self) -> ApiResult<()> {
        impl_db_dispatch!(self, {
            MySql(c) => c.close().await?,
            SQLite(c) => c.close().await?,
        });
        Ok(())
    }
}

/// Opens one connection per request.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    options: BackendOptions,
    target: String,
}

impl ConnectionProvider {
    pub fn new(options: BackendOptions, target: impl Into<String>) -> Self {
        Self {
            options,
            target: target.into(),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> ApiResult<Self> {
        Ok(Self::new(BackendOptions::from_config(config)?, config.target()))
    }

    pub fn db_type(&self) -> DatabaseType {
        self.options.db_type()
    }

    /// Connection target, safe to log.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Open a new connection.
    ///
    /// Failures are logged here and returned as [`ApiError::Connection`];
    /// the caller only decides the response.
    pub async fn acquire(&self) -> ApiResult<ConnectionGuard> {
        let result = match &self.options {
            BackendOptions::MySql(options) => options.connect().await.map(DbConnection::MySql),
            BackendOptions::SQLite(options) => options.connect().await.map(DbConnection::SQLite),
        };

        match result {
            Ok(conn) => {
                debug!(target_db = %self.target, db_type = %self.db_type(), "Connection opened");
                Ok(ConnectionGuard::new(conn))
            }
            Err(e) => {
                error!(target_db = %self.target, error = %e, "Failed to connect to database");
                Err(ApiError::connection(format!("Failed to connect: {}", e)))
            }
        }
    }
}

/// Scoped owner of a request's connection.
///
/// Call [`release`](Self::release) on every path once the statements are
/// done. A guard dropped without release (panic, cancelled request) drops
/// the socket without a clean shutdown and logs a warning.
///
/// ```ignore
/// let mut guard = provider.acquire().await?;
/// let result = repository::find(&mut guard, &filter).await;
/// guard.release().await;
/// let properties = result?;
/// ```
pub struct ConnectionGuard {
    conn: Option<DbConnection>,
    opened_at: Instant,
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("db_type", &self.conn.as_ref().map(DbConnection::db_type))
            .field("open", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}

impl ConnectionGuard {
    pub fn new(conn: DbConnection) -> Self {
        Self {
            conn: Some(conn),
            opened_at: Instant::now(),
        }
    }

    /// Borrow the underlying connection.
    pub fn connection(&mut self) -> ApiResult<&mut DbConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| ApiError::internal("Connection used after release"))
    }

    /// Close the connection. Close errors are logged, not returned: the
    /// request outcome is already decided at this point.
    pub async fn release(mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let held_ms = self.opened_at.elapsed().as_millis() as u64;
        match conn.close().await {
            Ok(()) => debug!(held_ms, "Connection closed"),
            Err(e) => warn!(held_ms, error = %e, "Failed to close connection cleanly"),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.conn.is_some() {
            warn!("Connection dropped without release - socket closed without shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_from_connection_string() {
        assert_eq!(
            DatabaseType::from_connection_string("mysql://host/db"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("MariaDB://host/db"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("sqlite:imoveis.db"),
            Some(DatabaseType::SQLite)
        );
        assert_eq!(DatabaseType::from_connection_string("postgres://host/db"), None);
    }

    #[test]
    fn test_options_default_to_mysql() {
        let options = BackendOptions::from_config(&DatabaseConfig::default()).unwrap();
        assert_eq!(options.db_type(), DatabaseType::MySQL);
    }

    #[test]
    fn test_options_from_sqlite_url() {
        let config = DatabaseConfig::from_url("sqlite::memory:");
        let options = BackendOptions::from_config(&config).unwrap();
        assert_eq!(options.db_type(), DatabaseType::SQLite);
    }

    #[test]
    fn test_options_from_mariadb_url() {
        let config = DatabaseConfig::from_url("mariadb://app:pw@db.internal:3306/imoveis");
        let options = BackendOptions::from_config(&config).unwrap();
        assert_eq!(options.db_type(), DatabaseType::MySQL);
    }

    #[test]
    fn test_options_reject_unknown_scheme() {
        let config = DatabaseConfig::from_url("postgres://host/db");
        let result = BackendOptions::from_config(&config);
        assert!(matches!(result, Err(ApiError::Connection { .. })));
    }

    #[test]
    fn test_options_with_ca_path() {
        let config = DatabaseConfig {
            ssl_ca_path: Some("/etc/ssl/ca.pem".into()),
            ..DatabaseConfig::default()
        };
        let options = BackendOptions::from_config(&config).unwrap();
        assert_eq!(options.db_type(), DatabaseType::MySQL);
    }

    #[tokio::test]
    async fn test_acquire_and_release_sqlite_memory() {
        let provider =
            ConnectionProvider::from_config(&DatabaseConfig::from_url("sqlite::memory:")).unwrap();
        let mut guard = provider.acquire().await.unwrap();
        assert_eq!(guard.connection().unwrap().db_type(), DatabaseType::SQLite);
        guard.release().await;
    }

    #[tokio::test]
    async fn test_acquire_failure_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("missing/imoveis.db").display());
        let provider = ConnectionProvider::from_config(&DatabaseConfig::from_url(url)).unwrap();
        let result = provider.acquire().await;
        assert!(matches!(result, Err(ApiError::Connection { .. })));
    }
}
