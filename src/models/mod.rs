//! Data models for the imoveis API.

pub mod property;

pub use property::{
    CREATED_MESSAGE, ColumnValue, DATE_FORMAT, Message, NewProperty, Property, PropertyColumn,
    PropertyList, REMOVED_MESSAGE, UPDATED_MESSAGE,
};
