use super::GenericRepository;
use crate::core::Result;
use crate::executor::StatementExecutor;
use crate::metadata::Entity;
use log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Hands out one shared [`GenericRepository`] per entity type.
pub struct RepositoryFactory {
    executor: Arc<dyn StatementExecutor>,
    repositories: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl RepositoryFactory {
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            executor,
            repositories: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the repository for `E`, building it on first request.
    ///
    /// Lookup and construction share one lock, so concurrent first callers
    /// all receive the same instance.
    pub fn get<E: Entity>(&self) -> Result<Arc<GenericRepository<E>>> {
        let mut repositories = self.repositories.lock()?;

        if let Some(existing) = repositories.get(&TypeId::of::<E>())
            && let Ok(repo) = Arc::clone(existing).downcast::<GenericRepository<E>>()
        {
            return Ok(repo);
        }

        let repo = Arc::new(GenericRepository::<E>::new(Arc::clone(&self.executor))?);
        debug!("created repository for table {}", repo.metadata().table_name);
        repositories.insert(TypeId::of::<E>(), repo.clone());
        Ok(repo)
    }

    /// Number of repositories built so far.
    pub fn len(&self) -> Result<usize> {
        Ok(self.repositories.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
