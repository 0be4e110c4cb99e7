use std::{env, time::Duration};

use async_trait::async_trait;
use bike_share::database::{
    Database, DatabaseAutocommit, DatabaseOperations, DatabaseTransaction,
};
use queries::convert_error;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Transaction,
};
use tokio::time::{sleep, Instant};

pub mod data_model;
pub mod queries;

pub const DEFAULT_MAINTENANCE_DATABASE: &str = "postgres";

/// Longest time `close` waits for connections which are still in use.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
    /// Database to connect to while the target database may not exist yet.
    pub maintenance_database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        let maintenance_database = env::var("DATABASE_MAINTENANCE_NAME")
            .unwrap_or_else(|_| DEFAULT_MAINTENANCE_DATABASE.to_owned());
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
            maintenance_database,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options().database(&self.database)
    }

    pub fn maintenance_connect_options(&self) -> PgConnectOptions {
        self.server_options().database(&self.maintenance_database)
    }

    fn server_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.hostname)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
    }
}

#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
    database: String,
    maintenance_options: PgConnectOptions,
}

pub struct PgDatabaseTransaction<'a> {
    tx: Transaction<'a, sqlx::Postgres>,
}

#[async_trait]
impl<'a> DatabaseTransaction for PgDatabaseTransaction<'a> {
    async fn commit(self) -> bike_share::database::Result<()> {
        self.tx.commit().await.map_err(convert_error)
    }
}

pub struct PgDatabaseAutocommit {
    pool: sqlx::PgPool,
}

impl DatabaseAutocommit for PgDatabaseAutocommit {}

impl DatabaseOperations for PgDatabaseAutocommit {}

impl<'a> DatabaseOperations for PgDatabaseTransaction<'a> {}

impl PgDatabase {
    /// Sets up the connection pool without connecting. Connections are
    /// established on first use, so the target database does not have to
    /// exist yet.
    pub fn new(database_connection_info: DatabaseConnectionInfo) -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy_with(database_connection_info.connect_options());

        Self {
            connection: pool,
            maintenance_options: database_connection_info.maintenance_connect_options(),
            database: database_connection_info.database,
        }
    }

    /// Waits until every connection of the pool is idle, or the timeout
    /// elapses. Returns whether the pool settled.
    ///
    /// A dropped transaction hands its connection back to the pool from a
    /// spawned task. `PgPool::close` does not wait for those returns, and a
    /// connection arriving after it finished stays open.
    async fn settle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.connection.num_idle() >= self.connection.size() as usize {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(CLOSE_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgDatabaseTransaction<'static>;
    type Autocommit = PgDatabaseAutocommit;

    async fn ensure_database(&self) -> bike_share::database::Result<()> {
        queries::schema::ensure_database(&self.maintenance_options, &self.database)
            .await
    }

    fn auto(&self) -> Self::Autocommit {
        PgDatabaseAutocommit {
            pool: self.connection.clone(),
        }
    }

    async fn transaction(&self) -> bike_share::database::Result<Self::Transaction> {
        let tx: Transaction<'static, sqlx::Postgres> =
            self.connection.begin().await.map_err(convert_error)?;

        Ok(PgDatabaseTransaction { tx })
    }

    async fn close(&self) {
        if !self.settle(CLOSE_TIMEOUT).await {
            log::warn!(
                "closing database {} with {} connections still in use",
                self.database,
                (self.connection.size() as usize).saturating_sub(self.connection.num_idle())
            );
        }
        self.connection.close().await;
        log::debug!("closed connection pool of database {}", self.database);
    }
}
