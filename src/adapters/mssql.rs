use crate::adapters::sql::SAMPLE_CUSTOMERS;
use crate::config::connection_string::ConnectionString;
use crate::config::SQL_CONNECTION_STRING;
use crate::domain::model::{Customer, UnifiedRecord};
use crate::utils::error::{Result, UnifyError};
use tiberius::{Client, Config, Row, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub type SqlServerClient = Client<Compat<TcpStream>>;

const JDBC_PREFIX: &str = "jdbc:sqlserver://";

const CREATE_CUSTOMERS: &str = "IF NOT EXISTS (SELECT * FROM sysobjects WHERE name='customers' AND xtype='U')
CREATE TABLE customers (
    id INT IDENTITY(1,1) PRIMARY KEY,
    name NVARCHAR(100),
    email NVARCHAR(100),
    city NVARCHAR(50)
)";

/// 判斷連線字串是否指向 SQL Server（ADO.NET / ODBC 或 JDBC 格式）
pub fn is_sql_server_connection_string(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.starts_with(JDBC_PREFIX) {
        return true;
    }
    if lowered.contains("://") {
        return false;
    }

    ConnectionString::parse(SQL_CONNECTION_STRING, raw)
        .map(|cs| cs.get("Server").or_else(|| cs.get("Data Source")).is_some())
        .unwrap_or(false)
}

pub fn parse_config(raw: &str) -> Result<Config> {
    let raw = raw.trim();
    let config = if raw.to_ascii_lowercase().starts_with(JDBC_PREFIX) {
        Config::from_jdbc_string(raw)?
    } else {
        Config::from_ado_string(raw)?
    };
    Ok(config)
}

async fn open(config: Config) -> Result<SqlServerClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Ok(Client::connect(config, tcp.compat_write()).await?)
}

pub async fn connect(raw: &str) -> Result<SqlServerClient> {
    let config = parse_config(raw)?;

    match open(config.clone()).await {
        // Azure SQL gateway 可能要求改連到實際節點
        Err(UnifyError::SqlServerError(tiberius::error::Error::Routing {
            host,
            port,
        })) => {
            tracing::debug!("SQL Server redirected the connection to {}:{}", host, port);
            let mut config = config;
            config.host(&host);
            config.port(port);
            open(config).await
        }
        other => other,
    }
}

fn seed_statement() -> String {
    let rows = (0..SAMPLE_CUSTOMERS.len())
        .map(|i| format!("(@P{}, @P{}, @P{})", i * 3 + 1, i * 3 + 2, i * 3 + 3))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO customers (name, email, city) VALUES {}", rows)
}

pub async fn ensure_seed(client: &mut SqlServerClient) -> Result<()> {
    client.execute(CREATE_CUSTOMERS, &[]).await?;

    let count = match client
        .query("SELECT COUNT(*) FROM customers", &[])
        .await?
        .into_row()
        .await?
    {
        Some(row) => row.try_get::<i32, _>(0)?.unwrap_or(0),
        None => 0,
    };

    if count == 0 {
        tracing::info!("Seeding {} sample customers", SAMPLE_CUSTOMERS.len());
        // 單一 INSERT 敘述，四筆一起成功或失敗；id 由 IDENTITY 產生
        let params: Vec<&dyn ToSql> = SAMPLE_CUSTOMERS
            .iter()
            .flat_map(|(_, name, email, city)| [name as &dyn ToSql, email, city])
            .collect();
        client.execute(seed_statement(), &params).await?;
    }

    Ok(())
}

fn text(row: &Row, column: &str) -> Result<Option<String>> {
    Ok(row.try_get::<&str, _>(column)?.map(str::to_string))
}

pub async fn fetch_all(client: &mut SqlServerClient) -> Result<Vec<UnifiedRecord>> {
    let rows = client
        .query("SELECT id, name, email, city FROM customers ORDER BY id", &[])
        .await?
        .into_first_result()
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        records.push(UnifiedRecord::SqlServer(Customer {
            id: i64::from(row.try_get::<i32, _>("id")?.unwrap_or_default()),
            name: text(row, "name")?,
            email: text(row, "email")?,
            city: text(row, "city")?,
        }));
    }
    Ok(records)
}

pub async fn close(client: SqlServerClient) {
    if let Err(e) = client.close().await {
        tracing::warn!("Failed to close SQL Server connection cleanly: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_sql_server_connection_strings() {
        assert!(is_sql_server_connection_string(
            "Driver={ODBC Driver 18 for SQL Server};Server=tcp:shop.database.windows.net,1433;Database=shop;Uid=app;Pwd=secret;Encrypt=yes;"
        ));
        assert!(is_sql_server_connection_string(
            "Data Source=localhost;Initial Catalog=shop;User ID=sa;Password=pw"
        ));
        assert!(is_sql_server_connection_string(
            "jdbc:sqlserver://localhost:1433;databaseName=shop;user=sa;password=pw"
        ));

        assert!(!is_sql_server_connection_string("postgres://app@localhost/shop"));
        assert!(!is_sql_server_connection_string("sqlite://customers.db?mode=rwc"));
        assert!(!is_sql_server_connection_string("not a database url"));
    }

    #[test]
    fn test_parse_ado_and_jdbc_addresses() {
        let ado = parse_config("Server=localhost,1433;Database=master;User Id=sa;Password=pw").unwrap();
        assert_eq!(ado.get_addr(), "localhost:1433");

        let jdbc = parse_config("jdbc:sqlserver://localhost:14330;databaseName=master;user=sa;password=pw").unwrap();
        assert_eq!(jdbc.get_addr(), "localhost:14330");
    }

    #[test]
    fn test_seed_statement_has_three_params_per_row() {
        let sql = seed_statement();
        assert!(sql.starts_with("INSERT INTO customers (name, email, city) VALUES (@P1, @P2, @P3)"));
        assert!(sql.ends_with("(@P10, @P11, @P12)"));
    }

    // 需要實際的 SQL Server：MSSQL_TEST_CONNECTION_STRING="Server=localhost,1433;User Id=sa;Password=...;TrustServerCertificate=true"
    #[tokio::test]
    #[ignore]
    async fn test_live_server_is_seeded_once() {
        let raw = std::env::var("MSSQL_TEST_CONNECTION_STRING").unwrap();

        let mut first = Vec::new();
        for _ in 0..2 {
            let mut client = connect(&raw).await.unwrap();
            ensure_seed(&mut client).await.unwrap();
            let records = fetch_all(&mut client).await.unwrap();
            close(client).await;

            if first.is_empty() {
                first = records;
            } else {
                assert_eq!(records, first);
            }
        }
        assert!(first.len() >= SAMPLE_CUSTOMERS.len());
    }
}
