use crate::connection::ConnectionConfig;
use crate::core::{OrmError, Result};
use crate::dialect::Dialect;
use crate::executor::{Statement, StatementExecutor};
use crate::metadata::{Entity, EntityDescriptor};
use crate::repository::{GenericRepository, RepositoryFactory};
use crate::schema::SchemaGenerator;
use log::{info, warn};
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

/// Collects entity types to bootstrap; see [`Orm::builder`].
pub struct OrmBuilder {
    config: ConnectionConfig,
    executor: Arc<dyn StatementExecutor>,
    entities: Vec<(Option<TypeId>, EntityDescriptor)>,
}

impl OrmBuilder {
    /// Registers a record type. Types without an entity marker are skipped
    /// during initialization.
    pub fn entity<E: Entity>(mut self) -> Self {
        self.entities.push((Some(TypeId::of::<E>()), E::descriptor()));
        self
    }

    /// Registers a descriptor that has no Rust type behind it; only its table
    /// is created.
    pub fn descriptor(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push((None, descriptor));
        self
    }

    /// Creates every registered entity's table, in registration order.
    pub fn initialize(self) -> Result<Orm> {
        self.config.validate()?;
        let generator = SchemaGenerator::for_dialect(self.config.dialect);

        let mut tables = Vec::new();
        let mut registered = HashSet::new();

        for (type_id, descriptor) in &self.entities {
            let Some(ddl) = generator.create_table_sql_for(descriptor)? else {
                warn!("{} is not an entity, no table created", descriptor.type_name);
                continue;
            };

            self.executor.execute_update(&Statement::new(ddl))?;

            let table = descriptor.table_name();
            info!("table {} ready for {}", table, descriptor.type_name);
            tables.push(table);
            if let Some(type_id) = type_id {
                registered.insert(*type_id);
            }
        }

        info!(
            "initialized {} table(s) on {}",
            tables.len(),
            self.config.to_url()
        );

        Ok(Orm {
            factory: RepositoryFactory::new(Arc::clone(&self.executor)),
            config: self.config,
            executor: self.executor,
            tables,
            registered,
        })
    }
}

/// Bootstrapped mapping context: tables exist for every registered entity and
/// repositories are handed out from a shared factory.
///
/// ```
/// use relmap::{ConnectionConfig, Dialect, Entity, MemoryExecutor, Orm, Repository};
/// use std::sync::Arc;
///
/// #[derive(Entity, Debug, Default, Clone, PartialEq)]
/// #[entity(table = "notes")]
/// struct Note {
///     #[id]
///     id: Option<i64>,
///     #[column(nullable = false)]
///     body: String,
/// }
///
/// let config = ConnectionConfig::from_url("sqlite://notes.db").unwrap();
/// let executor = Arc::new(MemoryExecutor::new(Dialect::Sqlite));
/// let orm = Orm::builder(config, executor).entity::<Note>().initialize().unwrap();
///
/// let notes = orm.repository::<Note>().unwrap();
/// let saved = notes.save(Note { id: None, body: "hi".into() }).unwrap();
/// assert_eq!(saved.id, Some(1));
/// ```
pub struct Orm {
    config: ConnectionConfig,
    executor: Arc<dyn StatementExecutor>,
    factory: RepositoryFactory,
    tables: Vec<String>,
    registered: HashSet<TypeId>,
}

impl Orm {
    pub fn builder(config: ConnectionConfig, executor: Arc<dyn StatementExecutor>) -> OrmBuilder {
        OrmBuilder {
            config,
            executor,
            entities: Vec::new(),
        }
    }

    /// Repository for an entity registered before initialization.
    pub fn repository<E: Entity>(&self) -> Result<Arc<GenericRepository<E>>> {
        if !self.registered.contains(&TypeId::of::<E>()) {
            return Err(OrmError::ConfigurationError(format!(
                "{} was not registered as an entity when the ORM was initialized",
                E::descriptor().type_name
            )));
        }
        self.factory.get::<E>()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn schema_generator(&self) -> SchemaGenerator {
        SchemaGenerator::for_dialect(self.config.dialect)
    }

    pub fn executor(&self) -> Arc<dyn StatementExecutor> {
        Arc::clone(&self.executor)
    }

    /// Tables created during initialization, in registration order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
}
