use crate::core::{OrmError, Result};
use crate::dialect::Dialect;
use serde::{Deserialize, Serialize};

/// Connection parameters for the database an [`Orm`](crate::facade::Orm) talks to.
///
/// The dialect decides the DDL flavour; the rest is handed to whatever opens
/// the connection behind the statement executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub dialect: Dialect,

    pub host: String,

    pub port: u16,

    /// Database name, or the file path for SQLite
    pub database: String,

    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,
}

impl ConnectionConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            host: "localhost".to_string(),
            port: default_port(dialect),
            database: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Same as [`ConnectionConfig::new`] with the dialect given by name.
    pub fn for_dialect(name: &str) -> Result<Self> {
        Ok(Self::new(Dialect::parse(name)?))
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Parse from connection string
    ///
    /// Format: `<dialect>://username:password@host:port/database`, or
    /// `sqlite://<path>` for SQLite. The scheme selects the dialect.
    ///
    /// ```
    /// use relmap::{ConnectionConfig, Dialect};
    ///
    /// let config = ConnectionConfig::from_url("postgres://app:secret@db:5433/shop").unwrap();
    /// assert_eq!(config.dialect, Dialect::PostgreSql);
    /// assert_eq!(config.port, 5433);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid("URL must look like '<dialect>://...'"))?;
        let dialect = Dialect::parse(scheme)?;

        if dialect == Dialect::Sqlite {
            if rest.is_empty() {
                return Err(invalid("SQLite URL needs a database path"));
            }
            return Ok(Self::new(dialect).host("").port(0).database(rest));
        }

        let (auth, location) = rest
            .split_once('@')
            .ok_or_else(|| invalid("Invalid URL format"))?;

        let (username, password) = auth
            .split_once(':')
            .ok_or_else(|| invalid("Invalid credentials format"))?;

        let (host_port, database) = location
            .split_once('/')
            .ok_or_else(|| invalid("Invalid host/database format"))?;

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (
                host,
                port.parse().map_err(|_| invalid("Invalid port"))?,
            ),
            None => (host_port, default_port(dialect)),
        };

        Ok(Self::new(dialect)
            .credentials(username, password)
            .host(host)
            .port(port)
            .database(database))
    }

    /// Connection string with the password masked.
    pub fn to_url(&self) -> String {
        if self.dialect == Dialect::Sqlite {
            return format!("{}://{}", self.dialect, self.database);
        }
        format!(
            "{}://{}:{}@{}:{}/{}",
            self.dialect,
            self.username,
            "***",
            self.host,
            self.port,
            self.database
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(invalid("Database cannot be empty"));
        }

        if self.dialect == Dialect::Sqlite {
            return Ok(());
        }

        if self.host.is_empty() {
            return Err(invalid("Host cannot be empty"));
        }

        if self.username.is_empty() {
            return Err(invalid("Username cannot be empty"));
        }

        if self.port == 0 {
            return Err(invalid("Port must be > 0"));
        }

        Ok(())
    }
}

fn default_port(dialect: Dialect) -> u16 {
    match dialect {
        Dialect::MySql | Dialect::MariaDb => 3306,
        Dialect::PostgreSql => 5432,
        Dialect::Sqlite => 0,
    }
}

fn invalid(msg: &str) -> OrmError {
    OrmError::ConfigurationError(msg.to_string())
}
