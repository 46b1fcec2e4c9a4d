pub mod factory;
pub mod generic;

use crate::core::{Result, Value};
use crate::metadata::Entity;

pub use factory::RepositoryFactory;
pub use generic::GenericRepository;

/// Whole-entity CRUD keyed by primary key.
pub trait Repository<E: Entity>: Send + Sync {
    /// Inserts `entity` and returns it with any generated key assigned.
    fn save(&self, entity: E) -> Result<E>;

    fn find_by_id(&self, id: Value) -> Result<Option<E>>;

    fn find_all(&self) -> Result<Vec<E>>;

    /// Deleting an id that matches nothing is not an error.
    fn delete(&self, id: Value) -> Result<()>;
}
