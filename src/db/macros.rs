//! Database dispatch macros for reducing code duplication.
//!
//! The MySQL and SQLite paths share their shape and differ only in the
//! concrete connection type, so these macros expand the per-backend arms.

/// Macro for generating database dispatch match arms.
///
/// This macro generates match arms for `DbConnection` variants.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(conn, {
///     MySql(c) => do_mysql(c),
///     SQLite(c) => do_sqlite(c),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($conn:expr, { $($variant:ident($c:ident) => $body:expr),+ $(,)? }) => {
        match $conn {
            $(
                $crate::db::provider::DbConnection::$variant($c) => $body,
            )+
        }
    };
}

/// Bind a slice of `BindValue`s to a `sqlx` query or `query_as` builder.
///
/// Works for any backend since both builders expose the same `bind`.
#[macro_export]
macro_rules! bind_values {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                $crate::db::repository::BindValue::Int(v) => query.bind(*v),
                $crate::db::repository::BindValue::Float(v) => query.bind(*v),
                $crate::db::repository::BindValue::Text(v) => query.bind(v.as_str()),
            };
        }
        query
    }};
}

pub use bind_values;
pub use impl_db_dispatch;
