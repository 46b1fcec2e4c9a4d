use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrmError {
    /// Entity declaration or dialect selection is unusable.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A row value could not populate a field, or an instance could not be built.
    #[error("Mapping error: {0}")]
    MappingError(String),

    /// The statement executor reported a failure.
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl OrmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::MappingError(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::ExecutionError(_))
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;

impl<T> From<std::sync::PoisonError<T>> for OrmError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::ExecutionError(format!("lock poisoned: {}", err))
    }
}
