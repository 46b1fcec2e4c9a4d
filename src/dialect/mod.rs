pub mod mapper;

use crate::core::{OrmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use mapper::{MySqlMapper, PostgresMapper, SqliteMapper, TypeMapper};

/// Database engine family targeted by generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    MySql,
    /// Same SQL surface as MySQL.
    MariaDb,
    PostgreSql,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Self::MySql, Self::MariaDb, Self::PostgreSql, Self::Sqlite];

    /// Case-insensitive lookup. `postgres` is accepted as an alias of `postgresql`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(OrmError::ConfigurationError(format!(
                "Unsupported database type: {}",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn is_mysql_family(&self) -> bool {
        matches!(self, Self::MySql | Self::MariaDb)
    }

    pub fn type_mapper(&self) -> &'static dyn TypeMapper {
        match self {
            Self::MySql | Self::MariaDb => &MySqlMapper,
            Self::PostgreSql => &PostgresMapper,
            Self::Sqlite => &SqliteMapper,
        }
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dialect {
    type Error = OrmError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.name().to_string()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Dialect::parse("MySQL").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::parse("MariaDB").unwrap(), Dialect::MariaDb);
        assert_eq!(Dialect::parse("PostgreSQL").unwrap(), Dialect::PostgreSql);
        assert_eq!(Dialect::parse("postgres").unwrap(), Dialect::PostgreSql);
        assert_eq!("SQLite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
    }

    #[test]
    fn test_unknown_dialect_is_configuration_error() {
        let err = Dialect::parse("oracle").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Dialect::PostgreSql).unwrap();
        assert_eq!(json, "\"postgresql\"");
        let back: Dialect = serde_json::from_str("\"MARIADB\"").unwrap();
        assert_eq!(back, Dialect::MariaDb);
        assert!(serde_json::from_str::<Dialect>("\"db2\"").is_err());
    }
}
