//! Schema registry & validator adapter (spec.md §4.1).

pub mod definitions;
pub mod registry;

pub use registry::{SchemaRegistry, SchemaRegistryError};
