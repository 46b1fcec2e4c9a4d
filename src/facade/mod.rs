pub mod orm;

pub use orm::{Orm, OrmBuilder};
