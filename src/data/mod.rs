//! Data module - CSV loading, schemas and normalization

mod loader;
mod normalizer;
pub mod schema;

pub use loader::{parse_locale_number, DataLoader, LoaderError};
pub use normalizer::{Normalizer, NormalizerError, SENTINEL_KEY};
pub use schema::SchemaError;
