use std::{fmt, str::FromStr};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::settings::DatabaseSettings;

#[derive(Debug, Clone)]
pub struct DB {
    pub path: String,
    pub create_if_missing: bool,
}

impl DB {
    /// A private database living only as long as the pool holding it.
    ///
    /// Every connection to `sqlite::memory:` opens a fresh database, so the
    /// pool built from this must keep a single connection.
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".into(),
            create_if_missing: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }

    pub fn connection_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new().filename(&self.path)
        };

        Ok(options
            .create_if_missing(self.create_if_missing)
            .foreign_keys(true))
    }

    pub fn pool_options(&self) -> SqlitePoolOptions {
        let options =
            SqlitePoolOptions::new().acquire_timeout(std::time::Duration::from_secs(2));

        if self.is_in_memory() {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
        }
    }

    pub fn connect_lazy(&self) -> Result<SqlitePool, sqlx::Error> {
        Ok(self
            .pool_options()
            .connect_lazy_with(self.connection_options()?))
    }

    pub async fn connect(&self) -> Result<SqlitePool, sqlx::Error> {
        self.pool_options()
            .connect_with(self.connection_options()?)
            .await
    }
}

impl Default for DB {
    fn default() -> Self {
        Self {
            path: "newsletters.db".into(),
            create_if_missing: true,
        }
    }
}

impl From<&DatabaseSettings> for DB {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            path: settings.path.clone(),
            create_if_missing: settings.create_if_missing,
        }
    }
}

impl fmt::Display for DB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Brings the schema up to date with the files under `migrations/`.
#[tracing::instrument(name = "Running database migrations", skip(db_pool))]
pub async fn migrate(db_pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(db_pool).await
}

/// Generated names for schema constraints.
///
/// | kind | template                                      |
/// |------|-----------------------------------------------|
/// | ix   | `ix_<table>_<column>`                         |
/// | uq   | `uq_<table>_<column>`                         |
/// | ck   | `ck_<table>_<constraint>`                     |
/// | fk   | `fk_<table>_<column>_<referred table>`        |
/// | pk   | `pk_<table>`                                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintName<'a> {
    Index { table: &'a str, column: &'a str },
    Unique { table: &'a str, column: &'a str },
    Check { table: &'a str, constraint: &'a str },
    ForeignKey {
        table: &'a str,
        column: &'a str,
        referred_table: &'a str,
    },
    PrimaryKey { table: &'a str },
}

impl fmt::Display for ConstraintName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index { table, column } => write!(f, "ix_{table}_{column}"),
            Self::Unique { table, column } => write!(f, "uq_{table}_{column}"),
            Self::Check { table, constraint } => write!(f, "ck_{table}_{constraint}"),
            Self::ForeignKey {
                table,
                column,
                referred_table,
            } => write!(f, "fk_{table}_{column}_{referred_table}"),
            Self::PrimaryKey { table } => write!(f, "pk_{table}"),
        }
    }
}
