//! Property record models.
//!
//! This module defines the `imoveis` row type, the create payload, the
//! allow-list of updatable columns and the JSON response envelopes.

use crate::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format accepted and returned for `data_aquisicao`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const UPDATED_MESSAGE: &str = "Imóvel atualizado com sucesso.";
pub const REMOVED_MESSAGE: &str = "Imóvel removido com sucesso.";
pub const CREATED_MESSAGE: &str = "imovel adicionado com sucesso";

/// One row of the `imoveis` table, decoded by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Property {
    pub id: i64,
    pub logradouro: String,
    pub tipo_logradouro: String,
    pub bairro: String,
    pub cidade: String,
    pub cep: String,
    pub tipo: String,
    pub valor: f64,
    /// Stored as DATE, always selected as `YYYY-MM-DD` text
    pub data_aquisicao: String,
}

/// Payload for creating a property. The id is assigned by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub logradouro: String,
    pub tipo_logradouro: String,
    pub bairro: String,
    pub cidade: String,
    pub cep: String,
    pub tipo: String,
    pub valor: f64,
    pub data_aquisicao: String,
}

impl NewProperty {
    /// Check the coarse types serde cannot: blank text, dates, non-finite values.
    pub fn validate(&self) -> ApiResult<()> {
        let text_fields = [
            (PropertyColumn::Logradouro, &self.logradouro),
            (PropertyColumn::TipoLogradouro, &self.tipo_logradouro),
            (PropertyColumn::Bairro, &self.bairro),
            (PropertyColumn::Cidade, &self.cidade),
            (PropertyColumn::Cep, &self.cep),
            (PropertyColumn::Tipo, &self.tipo),
        ];
        for (column, value) in text_fields {
            if value.trim().is_empty() {
                return Err(ApiError::invalid_input(format!(
                    "Campo '{}' não pode ser vazio",
                    column
                )));
            }
        }

        if !self.valor.is_finite() {
            return Err(ApiError::invalid_input(
                "Campo 'valor' deve ser um número válido",
            ));
        }

        parse_date(&self.data_aquisicao)?;
        Ok(())
    }
}

/// Columns that may be changed through the update route. `id` is never updatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyColumn {
    Logradouro,
    TipoLogradouro,
    Bairro,
    Cidade,
    Cep,
    Tipo,
    Valor,
    DataAquisicao,
}

impl PropertyColumn {
    pub const ALL: [PropertyColumn; 8] = [
        Self::Logradouro,
        Self::TipoLogradouro,
        Self::Bairro,
        Self::Cidade,
        Self::Cep,
        Self::Tipo,
        Self::Valor,
        Self::DataAquisicao,
    ];

    /// Column name as it appears in the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logradouro => "logradouro",
            Self::TipoLogradouro => "tipo_logradouro",
            Self::Bairro => "bairro",
            Self::Cidade => "cidade",
            Self::Cep => "cep",
            Self::Tipo => "tipo",
            Self::Valor => "valor",
            Self::DataAquisicao => "data_aquisicao",
        }
    }

    /// Convert a raw path value into the type stored in this column.
    pub fn coerce(&self, raw: &str) -> ApiResult<ColumnValue> {
        match self {
            Self::Valor => {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        ApiError::invalid_input(format!(
                            "Valor '{}' inválido para a coluna 'valor'",
                            raw
                        ))
                    })?;
                Ok(ColumnValue::Number(value))
            }
            Self::DataAquisicao => {
                let date = parse_date(raw)?;
                Ok(ColumnValue::Text(date.format(DATE_FORMAT).to_string()))
            }
            _ => Ok(ColumnValue::Text(raw.to_string())),
        }
    }
}

impl FromStr for PropertyColumn {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| {
                ApiError::invalid_input(format!("Coluna '{}' não pode ser atualizada", s))
            })
    }
}

impl fmt::Display for PropertyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced value ready to be bound to an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Number(f64),
}

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        ApiError::invalid_input(format!(
            "Data '{}' inválida, use o formato AAAA-MM-DD",
            raw
        ))
    })
}

/// `{"imovel": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyList {
    pub imovel: Vec<Property>,
}

/// `{"mensagem": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub mensagem: String,
}

impl Message {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            mensagem: mensagem.into(),
        }
    }
}
