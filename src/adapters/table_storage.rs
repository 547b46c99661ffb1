use crate::adapters::rest::{ensure_success, i64_field, string_field};
use crate::adapters::signing::{http_date, table_shared_key_lite, AccountKey};
use crate::config::connection_string::ConnectionString;
use crate::config::{StoreConfig, TABLE_STORAGE_CONNECTION_STRING};
use crate::domain::model::{DbKind, Employee, UnifiedRecord};
use crate::domain::ports::StoreAccessor;
use crate::utils::error::Result;
use crate::utils::validation::{required_connection_string, validate_url, HTTP_SCHEMES};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

const API_VERSION: &str = "2019-02-02";
const STORE: &str = "Table Storage";
const ODATA_JSON: &str = "application/json;odata=nometadata";
// Table 服務單頁上限為 1000 筆
const PAGE_SIZE: usize = 1000;

const EMULATOR_ACCOUNT: &str = "devstoreaccount1";
const EMULATOR_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const EMULATOR_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// 鍵值資料庫：storage account 的 `employees` 資料表
#[derive(Debug, Clone)]
pub struct TableStorageAccessor {
    connection_string: Option<String>,
    table: String,
}

impl TableStorageAccessor {
    pub fn new(connection_string: Option<String>, table: String) -> Self {
        Self {
            connection_string,
            table,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            config.table_storage_connection_string.clone(),
            config.table_name.clone(),
        )
    }
}

fn sample_employees() -> Vec<Value> {
    vec![
        json!({
            "PartitionKey": "HR",
            "RowKey": "001",
            "name": "Alice Johnson",
            "department": "Human Resources",
            "salary": 75000
        }),
        json!({
            "PartitionKey": "IT",
            "RowKey": "002",
            "name": "Bob Wilson",
            "department": "Information Technology",
            "salary": 85000
        }),
        json!({
            "PartitionKey": "Sales",
            "RowKey": "003",
            "name": "Carol Davis",
            "department": "Sales",
            "salary": 65000
        }),
    ]
}

#[derive(Debug, Deserialize)]
struct EntityPage {
    #[serde(default)]
    value: Vec<Value>,
}

/// 查詢下一頁的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub next_partition_key: String,
    pub next_row_key: Option<String>,
}

/// 綁定單一資料表的簽章 REST client
pub struct TableClient {
    http: Client,
    account: String,
    key: AccountKey,
    endpoint: String,
    endpoint_path: String,
    table: String,
}

impl TableClient {
    pub fn from_connection_string(raw: &str, table: &str) -> Result<Self> {
        let cs = ConnectionString::parse(TABLE_STORAGE_CONNECTION_STRING, raw)?;

        let (account, key, endpoint) = if cs
            .get("UseDevelopmentStorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            (
                EMULATOR_ACCOUNT.to_string(),
                EMULATOR_KEY.to_string(),
                EMULATOR_ENDPOINT.to_string(),
            )
        } else {
            let account = cs.require(TABLE_STORAGE_CONNECTION_STRING, "AccountName")?;
            let key = cs.require(TABLE_STORAGE_CONNECTION_STRING, "AccountKey")?;
            let endpoint = match cs.get("TableEndpoint").filter(|v| !v.is_empty()) {
                Some(endpoint) => endpoint.to_string(),
                None => format!(
                    "{}://{}.table.{}",
                    cs.get("DefaultEndpointsProtocol").unwrap_or("https"),
                    account,
                    cs.get("EndpointSuffix").unwrap_or("core.windows.net")
                ),
            };
            (account.to_string(), key.to_string(), endpoint)
        };

        let endpoint = validate_url(TABLE_STORAGE_CONNECTION_STRING, &endpoint, HTTP_SCHEMES)?;

        Ok(Self {
            http: Client::new(),
            key: AccountKey::from_base64(&key)?,
            account,
            endpoint_path: endpoint.path().trim_end_matches('/').to_string(),
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            table: table.to_string(),
        })
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        let date = http_date(Utc::now());
        let canonical_path = format!("{}/{}", self.endpoint_path, resource);
        let authorization = table_shared_key_lite(&self.key, &self.account, &canonical_path, &date);

        self.http
            .request(method, format!("{}/{}", self.endpoint, resource))
            .header("Authorization", authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("Accept", ODATA_JSON)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx")
    }

    /// 建立資料表，已存在視為成功
    pub async fn create_table_if_missing(&self) -> Result<bool> {
        let response = self
            .request(Method::POST, "Tables")
            .header("Prefer", "return-no-content")
            .json(&json!({ "TableName": self.table }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        ensure_success(STORE, response).await?;
        tracing::info!("Created table {}", self.table);
        Ok(true)
    }

    pub async fn query_page(
        &self,
        top: usize,
        continuation: Option<&Continuation>,
    ) -> Result<(Vec<Value>, Option<Continuation>)> {
        let mut query: Vec<(&str, String)> = vec![("$top", top.to_string())];
        if let Some(c) = continuation {
            query.push(("NextPartitionKey", c.next_partition_key.clone()));
            if let Some(row_key) = &c.next_row_key {
                query.push(("NextRowKey", row_key.clone()));
            }
        }

        let request = self
            .request(Method::GET, &format!("{}()", self.table))
            .query(&query);
        let response = ensure_success(STORE, request.send().await?).await?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let next = header("x-ms-continuation-NextPartitionKey").map(|next_partition_key| Continuation {
            next_partition_key,
            next_row_key: header("x-ms-continuation-NextRowKey"),
        });

        let page: EntityPage = response.json().await?;
        Ok((page.value, next))
    }

    pub async fn insert_entity(&self, entity: &Value) -> Result<()> {
        let request = self
            .request(Method::POST, &self.table)
            .header("Prefer", "return-no-content")
            .json(entity);
        ensure_success(STORE, request.send().await?).await?;
        Ok(())
    }
}

fn to_record(entity: &Value) -> UnifiedRecord {
    UnifiedRecord::TableStorage(Employee {
        partition_key: string_field(entity, "PartitionKey"),
        row_key: string_field(entity, "RowKey"),
        name: string_field(entity, "name"),
        department: string_field(entity, "department"),
        salary: i64_field(entity, "salary"),
    })
}

#[async_trait]
impl StoreAccessor for TableStorageAccessor {
    type Handle = TableClient;

    fn kind(&self) -> DbKind {
        DbKind::TableStorage
    }

    async fn connect(&self) -> Result<TableClient> {
        let raw = required_connection_string(
            TABLE_STORAGE_CONNECTION_STRING,
            &self.connection_string,
        )?;
        TableClient::from_connection_string(raw, &self.table)
    }

    async fn ensure_seed(&self, client: &mut TableClient) -> Result<()> {
        client.create_table_if_missing().await?;

        let (peek, _) = client.query_page(1, None).await?;
        if !peek.is_empty() {
            return Ok(());
        }

        let samples = sample_employees();
        tracing::info!("Seeding {} sample employees into {}", samples.len(), client.table);
        for employee in &samples {
            client.insert_entity(employee).await?;
        }
        Ok(())
    }

    async fn fetch_all(&self, client: &mut TableClient) -> Result<Vec<UnifiedRecord>> {
        let mut records = Vec::new();
        let mut continuation: Option<Continuation> = None;

        loop {
            let (entities, next) = client.query_page(PAGE_SIZE, continuation.as_ref()).await?;
            records.extend(entities.iter().map(to_record));
            if next.is_none() {
                break;
            }
            continuation = next;
        }

        Ok(records)
    }
}
