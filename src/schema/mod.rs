pub mod generator;

pub use generator::{SchemaGenerator, generate_create_table};
