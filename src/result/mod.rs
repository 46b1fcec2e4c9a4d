pub mod result;
pub mod row;

pub use result::QueryResult;
pub use row::Row;
