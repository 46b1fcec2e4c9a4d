pub mod error;
pub mod types;
pub mod value;

pub use error::{OrmError, Result};
pub use types::{ColumnType, SemanticType};
pub use value::Value;
