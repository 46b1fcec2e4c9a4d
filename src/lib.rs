// ============================================================================
// relmap Library
// ============================================================================

//! Metadata-driven object/relational mapping.
//!
//! Record types declare their table mapping with `#[derive(Entity)]`; the
//! extracted [`EntityMetadata`] drives dialect-aware DDL
//! ([`SchemaGenerator`]), row conversion ([`EntityMapper`]) and whole-entity
//! CRUD ([`GenericRepository`]) over an injected [`StatementExecutor`].

extern crate self as relmap;

pub mod core;
pub mod dialect;
pub mod metadata;
pub mod schema;
pub mod mapper;
pub mod result;
pub mod executor;
pub mod repository;
pub mod connection;
pub mod facade;
mod parser;
mod storage;

// Re-export main types for convenience
pub use crate::core::{ColumnType, OrmError, Result, SemanticType, Value};
pub use dialect::{Dialect, MySqlMapper, PostgresMapper, SqliteMapper, TypeMapper};
pub use metadata::{
    ColumnMarker, ColumnMetadata, Entity, EntityDescriptor, EntityMarker, EntityMetadata,
    FieldDescriptor, MetadataExtractor,
};
pub use schema::{SchemaGenerator, generate_create_table};
pub use mapper::EntityMapper;
pub use result::{QueryResult, Row};
pub use executor::{MemoryExecutor, Statement, StatementExecutor, UpdateOutcome};
pub use repository::{GenericRepository, Repository, RepositoryFactory};
pub use connection::ConnectionConfig;
pub use facade::{Orm, OrmBuilder};

// Derive macro; lives in the macro namespace next to the `Entity` trait.
pub use relmap_derive::Entity;
