//! Route handlers.
//!
//! Each handler opens its own connection, runs its statements, releases the
//! connection and only then turns the outcome into a response.

use crate::db::repository::{self, PropertyFilter};
use crate::db::{ConnectionGuard, ConnectionProvider};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CREATED_MESSAGE, ColumnValue, Message, NewProperty, PropertyColumn, PropertyList,
    REMOVED_MESSAGE, UPDATED_MESSAGE,
};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::info;

/// Shared state: only the connection provider, which is immutable.
#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Arc<ConnectionProvider>,
}

impl AppState {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }
}

/// GET /imoveis
pub async fn list_properties(State(state): State<AppState>) -> ApiResult<Json<PropertyList>> {
    find_properties(&state, PropertyFilter::All).await
}

/// GET /imoveis/{id}
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PropertyList>> {
    find_properties(&state, PropertyFilter::Id(id)).await
}

/// GET /imoveis/tipo/{tipo}
pub async fn get_properties_by_tipo(
    State(state): State<AppState>,
    Path(tipo): Path<String>,
) -> ApiResult<Json<PropertyList>> {
    find_properties(&state, PropertyFilter::Tipo(tipo)).await
}

/// GET /imoveis/cidade/{cidade}
pub async fn get_properties_by_cidade(
    State(state): State<AppState>,
    Path(cidade): Path<String>,
) -> ApiResult<Json<PropertyList>> {
    find_properties(&state, PropertyFilter::Cidade(cidade)).await
}

async fn find_properties(state: &AppState, filter: PropertyFilter) -> ApiResult<Json<PropertyList>> {
    let mut guard = state.provider.acquire().await?;
    let result = repository::find(&mut guard, &filter).await;
    guard.release().await;

    let properties = result?;
    if properties.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(PropertyList {
        imovel: properties,
    }))
}

/// PUT /imoveis/atualiza/{id}/{coluna}/{alteracao}
///
/// The column and value are validated before any connection is opened.
pub async fn update_property(
    State(state): State<AppState>,
    Path((id, coluna, alteracao)): Path<(i64, String, String)>,
) -> ApiResult<Json<Message>> {
    let column: PropertyColumn = coluna.parse()?;
    let value = column.coerce(&alteracao)?;

    let mut guard = state.provider.acquire().await?;
    let result = update_existing(&mut guard, id, column, &value).await;
    guard.release().await;
    result?;

    info!(id, column = %column, "Property updated");
    Ok(Json(Message::new(UPDATED_MESSAGE)))
}

async fn update_existing(
    guard: &mut ConnectionGuard,
    id: i64,
    column: PropertyColumn,
    value: &ColumnValue,
) -> ApiResult<()> {
    if !repository::exists(guard, id).await? {
        return Err(ApiError::NotFound);
    }
    repository::update_column(guard, id, column, value).await?;
    Ok(())
}

/// DELETE /imoveis/delete/{id}
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let mut guard = state.provider.acquire().await?;
    let result = repository::delete(&mut guard, id).await;
    guard.release().await;

    let rows_affected = result?;
    info!(id, rows_affected, "Property delete executed");
    Ok(Json(Message::new(REMOVED_MESSAGE)))
}

/// POST /imoveis
pub async fn create_property(
    State(state): State<AppState>,
    payload: Result<Json<NewProperty>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Json(property) = payload.map_err(|rejection| {
        ApiError::invalid_input(format!(
            "Corpo da requisição inválido: {}",
            rejection.body_text()
        ))
    })?;
    property.validate()?;

    let mut guard = state.provider.acquire().await?;
    let result = repository::insert(&mut guard, &property).await;
    guard.release().await;

    let id = result?;
    info!(id, "Property created");
    Ok((StatusCode::CREATED, Json(Message::new(CREATED_MESSAGE))))
}
