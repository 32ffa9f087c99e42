//! imoveis API Library
//!
//! HTTP service over a single `imoveis` table of real-estate property
//! records: list, filter, update one field, delete and create.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;

pub use config::Config;
pub use error::ApiError;
pub use http::{AppState, HttpServer, router};
