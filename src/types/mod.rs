//! SQL types, result metadata and cell coercion.

mod cell;
pub mod coercion;
mod mapping;
mod schema;

pub use cell::Cell;
pub use mapping::{SqlType, StructField};
pub use schema::{ColumnMetadata, ResultMetadata};
