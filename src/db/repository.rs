//! Statements against the `imoveis` table.
//!
//! Every value reaching the database is a bound parameter. The only text
//! spliced into a statement is a column name taken from [`PropertyColumn`].
//!
//! # Architecture
//!
//! Statement text lives in backend submodules:
//! - `mysql`: casts DATE and DECIMAL columns to text and double, compares filters as binary
//! - `sqlite`: used for local development and tests
//!
//! Rows are decoded by column name into [`Property`].

use crate::db::provider::ConnectionGuard;
use crate::error::ApiResult;
use crate::models::{ColumnValue, NewProperty, Property, PropertyColumn};
use sqlx::{MySql, Sqlite};
use std::time::Instant;
use tracing::debug;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&ColumnValue> for BindValue {
    fn from(value: &ColumnValue) -> Self {
        match value {
            ColumnValue::Text(v) => Self::Text(v.clone()),
            ColumnValue::Number(v) => Self::Float(*v),
        }
    }
}

/// Row selection for read queries.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFilter {
    All,
    Id(i64),
    /// Exact, case-sensitive match on `tipo`
    Tipo(String),
    /// Exact, case-sensitive match on `cidade`
    Cidade(String),
}

impl PropertyFilter {
    fn params(&self) -> Vec<BindValue> {
        match self {
            Self::All => Vec::new(),
            Self::Id(id) => vec![BindValue::Int(*id)],
            Self::Tipo(v) | Self::Cidade(v) => vec![BindValue::Text(v.clone())],
        }
    }
}

const INSERT_PROPERTY: &str = "INSERT INTO imoveis \
    (logradouro, tipo_logradouro, bairro, cidade, cep, tipo, valor, data_aquisicao) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const EXISTS_PROPERTY: &str = "SELECT 1 FROM imoveis WHERE id = ? LIMIT 1";
const DELETE_PROPERTY: &str = "DELETE FROM imoveis WHERE id = ?";

fn update_sql(column: PropertyColumn) -> String {
    format!("UPDATE imoveis SET {} = ? WHERE id = ?", column.as_str())
}

fn insert_params(property: &NewProperty) -> Vec<BindValue> {
    vec![
        BindValue::Text(property.logradouro.clone()),
        BindValue::Text(property.tipo_logradouro.clone()),
        BindValue::Text(property.bairro.clone()),
        BindValue::Text(property.cidade.clone()),
        BindValue::Text(property.cep.clone()),
        BindValue::Text(property.tipo.clone()),
        BindValue::Float(property.valor),
        BindValue::Text(property.data_aquisicao.clone()),
    ]
}

/// Fetch the rows matching `filter`, ordered by id.
pub async fn find(guard: &mut ConnectionGuard, filter: &PropertyFilter) -> ApiResult<Vec<Property>> {
    let start = Instant::now();
    let params = filter.params();

    let properties = impl_db_dispatch!(guard.connection()?, {
        MySql(conn) => {
            let sql = mysql::select_sql(filter);
            bind_values!(sqlx::query_as::<MySql, Property>(&sql), &params)
                .fetch_all(conn)
                .await?
        },
        SQLite(conn) => {
            let sql = sqlite::select_sql(filter);
            bind_values!(sqlx::query_as::<Sqlite, Property>(&sql), &params)
                .fetch_all(conn)
                .await?
        },
    });

    debug!(
        filter = ?filter,
        rows = properties.len(),
        execution_time_ms = start.elapsed().as_millis() as u64,
        "Fetched properties"
    );
    Ok(properties)
}

/// Whether a row with this id exists.
pub async fn exists(guard: &mut ConnectionGuard, id: i64) -> ApiResult<bool> {
    let found = impl_db_dispatch!(guard.connection()?, {
        MySql(conn) => sqlx::query::<MySql>(EXISTS_PROPERTY).bind(id).fetch_optional(conn).await?.is_some(),
        SQLite(conn) => sqlx::query::<Sqlite>(EXISTS_PROPERTY).bind(id).fetch_optional(conn).await?.is_some(),
    });
    Ok(found)
}

/// Set one column of one row. Returns the number of rows changed.
pub async fn update_column(
    guard: &mut ConnectionGuard,
    id: i64,
    column: PropertyColumn,
    value: &ColumnValue,
) -> ApiResult<u64> {
    let sql = update_sql(column);
    let params = [BindValue::from(value), BindValue::Int(id)];

    let rows_affected = impl_db_dispatch!(guard.connection()?, {
        MySql(conn) => bind_values!(sqlx::query::<MySql>(&sql), &params).execute(conn).await?.rows_affected(),
        SQLite(conn) => bind_values!(sqlx::query::<Sqlite>(&sql), &params).execute(conn).await?.rows_affected(),
    });

    debug!(id, column = %column, rows_affected, "Updated property column");
    Ok(rows_affected)
}

/// Delete by id. Deleting a missing id affects zero rows and is not an error.
pub async fn delete(guard: &mut ConnectionGuard, id: i64) -> ApiResult<u64> {
    let rows_affected = impl_db_dispatch!(guard.connection()?, {
        MySql(conn) => sqlx::query::<MySql>(DELETE_PROPERTY).bind(id).execute(conn).await?.rows_affected(),
        SQLite(conn) => sqlx::query::<Sqlite>(DELETE_PROPERTY).bind(id).execute(conn).await?.rows_affected(),
    });
    Ok(rows_affected)
}

/// Insert a new row and return the id assigned by the database.
pub async fn insert(guard: &mut ConnectionGuard, property: &NewProperty) -> ApiResult<i64> {
    let params = insert_params(property);

    let id = impl_db_dispatch!(guard.connection()?, {
        MySql(conn) => {
            let result = bind_values!(sqlx::query::<MySql>(INSERT_PROPERTY), &params)
                .execute(conn)
                .await?;
            result.last_insert_id() as i64
        },
        SQLite(conn) => {
            let result = bind_values!(sqlx::query::<Sqlite>(INSERT_PROPERTY), &params)
                .execute(conn)
                .await?;
            result.last_insert_rowid()
        },
    });
    Ok(id)
}

mod mysql {
    use super::PropertyFilter;

    // DECIMAL and DATE have no plain Rust decode without extra features
    const SELECT_PROPERTIES: &str = "SELECT CAST(id AS SIGNED) AS id, logradouro, \
        tipo_logradouro, bairro, cidade, cep, tipo, CAST(valor AS DOUBLE) AS valor, \
        CAST(data_aquisicao AS CHAR) AS data_aquisicao FROM imoveis";

    pub fn select_sql(filter: &PropertyFilter) -> String {
        let clause = match filter {
            PropertyFilter::All => "",
            PropertyFilter::Id(_) => " WHERE id = ?",
            PropertyFilter::Tipo(_) => " WHERE CAST(tipo AS BINARY) = CAST(? AS BINARY)",
            PropertyFilter::Cidade(_) => " WHERE CAST(cidade AS BINARY) = CAST(? AS BINARY)",
        };
        format!("{}{} ORDER BY id", SELECT_PROPERTIES, clause)
    }
}

mod sqlite {
    use super::PropertyFilter;

    const SELECT_PROPERTIES: &str = "SELECT id, logradouro, tipo_logradouro, bairro, \
        cidade, cep, tipo, CAST(valor AS REAL) AS valor, \
        CAST(data_aquisicao AS TEXT) AS data_aquisicao FROM imoveis";

    pub fn select_sql(filter: &PropertyFilter) -> String {
        let clause = match filter {
            PropertyFilter::All => "",
            PropertyFilter::Id(_) => " WHERE id = ?",
            PropertyFilter::Tipo(_) => " WHERE tipo = ?",
            PropertyFilter::Cidade(_) => " WHERE cidade = ?",
        };
        format!("{}{} ORDER BY id", SELECT_PROPERTIES, clause)
    }
}
