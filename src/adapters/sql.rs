use crate::adapters::mssql::{self, SqlServerClient};
use crate::config::{StoreConfig, SQL_CONNECTION_STRING};
use crate::domain::model::{Customer, DbKind, UnifiedRecord};
use crate::domain::ports::{SeedPolicy, StoreAccessor};
use crate::utils::error::Result;
use crate::utils::validation::{required_connection_string, validate_url};
use async_trait::async_trait;
use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection, Row};

const SQL_SCHEMES: &[&str] = &["postgres", "postgresql", "sqlite"];

const CREATE_CUSTOMERS: &str = "CREATE TABLE IF NOT EXISTS customers (
    id BIGINT PRIMARY KEY,
    name VARCHAR(100),
    email VARCHAR(100),
    city VARCHAR(50)
)";

pub(crate) static SAMPLE_CUSTOMERS: [(i64, &str, &str, &str); 4] = [
    (1, "John Doe", "john@example.com", "New York"),
    (2, "Jane Smith", "jane@example.com", "Los Angeles"),
    (3, "Bob Johnson", "bob@example.com", "Chicago"),
    (4, "Alice Brown", "alice@example.com", "Houston"),
];

/// 關聯式資料庫的 `customers` 資料表；SQL Server 走 tiberius，其餘走 sqlx
#[derive(Debug, Clone)]
pub struct SqlAccessor {
    connection_string: Option<String>,
}

impl SqlAccessor {
    pub fn new(connection_string: Option<String>) -> Self {
        Self { connection_string }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.sql_connection_string.clone())
    }
}

/// 一次呼叫期間持有的連線
pub enum SqlHandle {
    Sqlx(AnyConnection),
    SqlServer(SqlServerClient),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlBackend {
    Sqlx,
    SqlServer,
}

fn detect_backend(raw: &str) -> Result<SqlBackend> {
    if mssql::is_sql_server_connection_string(raw) {
        return Ok(SqlBackend::SqlServer);
    }
    validate_url(SQL_CONNECTION_STRING, raw, SQL_SCHEMES)?;
    Ok(SqlBackend::Sqlx)
}

// 樣本資料皆為常數，直接組成單一 INSERT，避免不同後端的佔位符差異
fn seed_statement() -> String {
    let values = SAMPLE_CUSTOMERS
        .iter()
        .map(|(id, name, email, city)| format!("({}, '{}', '{}', '{}')", id, name, email, city))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO customers (id, name, email, city) VALUES {}", values)
}

async fn ensure_seed_sqlx(conn: &mut AnyConnection) -> Result<()> {
    sqlx::query(CREATE_CUSTOMERS).execute(&mut *conn).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        tracing::info!("Seeding {} sample customers", SAMPLE_CUSTOMERS.len());
        let mut tx = conn.begin().await?;
        sqlx::query(&seed_statement()).execute(&mut *tx).await?;
        tx.commit().await?;
    }

    Ok(())
}

async fn fetch_all_sqlx(conn: &mut AnyConnection) -> Result<Vec<UnifiedRecord>> {
    let rows = sqlx::query("SELECT id, name, email, city FROM customers ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(UnifiedRecord::SqlServer(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            city: row.try_get("city")?,
        }));
    }
    Ok(records)
}

#[async_trait]
impl StoreAccessor for SqlAccessor {
    type Handle = SqlHandle;

    fn kind(&self) -> DbKind {
        DbKind::SqlServer
    }

    fn seed_policy(&self) -> SeedPolicy {
        SeedPolicy::Required
    }

    async fn connect(&self) -> Result<SqlHandle> {
        let raw = required_connection_string(SQL_CONNECTION_STRING, &self.connection_string)?;

        match detect_backend(raw)? {
            SqlBackend::SqlServer => {
                let client = mssql::connect(raw).await?;
                tracing::debug!("Connected to SQL Server");
                Ok(SqlHandle::SqlServer(client))
            }
            SqlBackend::Sqlx => {
                install_default_drivers();
                let conn = AnyConnection::connect(raw).await?;
                tracing::debug!("Connected to relational store ({})", conn.backend_name());
                Ok(SqlHandle::Sqlx(conn))
            }
        }
    }

    async fn ensure_seed(&self, handle: &mut SqlHandle) -> Result<()> {
        match handle {
            SqlHandle::Sqlx(conn) => ensure_seed_sqlx(conn).await,
            SqlHandle::SqlServer(client) => mssql::ensure_seed(client).await,
        }
    }

    async fn fetch_all(&self, handle: &mut SqlHandle) -> Result<Vec<UnifiedRecord>> {
        match handle {
            SqlHandle::Sqlx(conn) => fetch_all_sqlx(conn).await,
            SqlHandle::SqlServer(client) => mssql::fetch_all(client).await,
        }
    }

    async fn close(&self, handle: SqlHandle) {
        match handle {
            SqlHandle::Sqlx(conn) => {
                if let Err(e) = conn.close().await {
                    tracing::warn!("Failed to close relational connection cleanly: {}", e);
                }
            }
            SqlHandle::SqlServer(client) => mssql::close(client).await,
        }
    }
}
