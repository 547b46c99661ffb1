use crate::adapters::rest::{ensure_success, f64_field, string_field};
use crate::adapters::signing::{cosmos_master_token, http_date, AccountKey};
use crate::config::connection_string::ConnectionString;
use crate::config::{StoreConfig, COSMOS_CONNECTION_STRING};
use crate::domain::model::{DbKind, Product, UnifiedRecord};
use crate::domain::ports::StoreAccessor;
use crate::utils::error::Result;
use crate::utils::validation::{required_connection_string, validate_url, HTTP_SCHEMES};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

const API_VERSION: &str = "2018-12-31";
const STORE: &str = "Cosmos DB";
const PAGE_SIZE: &str = "1000";

/// 主要文件資料庫：Cosmos DB 的 `items` container
#[derive(Debug, Clone)]
pub struct CosmosAccessor {
    connection_string: Option<String>,
    database: String,
    container: String,
}

impl CosmosAccessor {
    pub fn new(connection_string: Option<String>, database: String, container: String) -> Self {
        Self {
            connection_string,
            database,
            container,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            config.cosmos_connection_string.clone(),
            config.cosmos_database.clone(),
            config.cosmos_container.clone(),
        )
    }
}

fn sample_products() -> Vec<Value> {
    vec![
        json!({"id": "1", "product": "Laptop", "price": 999.99, "category": "Electronics"}),
        json!({"id": "2", "product": "Phone", "price": 599.99, "category": "Electronics"}),
        json!({"id": "3", "product": "Desk", "price": 299.99, "category": "Furniture"}),
        json!({"id": "4", "product": "Chair", "price": 199.99, "category": "Furniture"}),
    ]
}

#[derive(Debug, Deserialize)]
struct DocumentFeed {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CollectionProperties {
    #[serde(rename = "partitionKey")]
    partition_key: Option<PartitionKeyDefinition>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyDefinition {
    #[serde(default)]
    paths: Vec<String>,
}

/// 綁定單一 container 的簽章 REST client
pub struct CosmosClient {
    http: Client,
    endpoint: String,
    key: AccountKey,
    collection_link: String,
}

impl CosmosClient {
    pub fn from_connection_string(raw: &str, database: &str, container: &str) -> Result<Self> {
        let cs = ConnectionString::parse(COSMOS_CONNECTION_STRING, raw)?;
        let endpoint = validate_url(
            COSMOS_CONNECTION_STRING,
            cs.require(COSMOS_CONNECTION_STRING, "AccountEndpoint")?,
            HTTP_SCHEMES,
        )?;
        let key = AccountKey::from_base64(cs.require(COSMOS_CONNECTION_STRING, "AccountKey")?)?;

        Ok(Self {
            http: Client::new(),
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            key,
            collection_link: format!("dbs/{}/colls/{}", database, container),
        })
    }

    fn request(&self, method: Method, path: &str, resource_type: &str) -> RequestBuilder {
        let date = http_date(Utc::now());
        let token = cosmos_master_token(
            &self.key,
            method.as_str(),
            resource_type,
            &self.collection_link,
            &date,
        );

        self.http
            .request(method, format!("{}/{}", self.endpoint, path))
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("Accept", "application/json")
    }

    /// 讀取一頁文件，並回傳下一頁的 continuation token
    pub async fn read_page(
        &self,
        max_items: &str,
        continuation: Option<&str>,
    ) -> Result<(Vec<Value>, Option<String>)> {
        let mut request = self
            .request(Method::GET, &format!("{}/docs", self.collection_link), "docs")
            .header("x-ms-max-item-count", max_items);
        if let Some(token) = continuation {
            request = request.header("x-ms-continuation", token);
        }

        let response = ensure_success(STORE, request.send().await?).await?;
        let next = response
            .headers()
            .get("x-ms-continuation")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let feed: DocumentFeed = response.json().await?;
        Ok((feed.documents, next))
    }

    pub async fn partition_key_path(&self) -> Result<Option<String>> {
        let request = self.request(Method::GET, &self.collection_link, "colls");
        let response = ensure_success(STORE, request.send().await?).await?;
        let properties: CollectionProperties = response.json().await?;
        Ok(properties
            .partition_key
            .and_then(|pk| pk.paths.into_iter().next()))
    }

    pub async fn create_document(&self, document: &Value, partition_key_path: Option<&str>) -> Result<()> {
        let mut request = self
            .request(Method::POST, &format!("{}/docs", self.collection_link), "docs")
            .json(document);
        if let Some(path) = partition_key_path {
            let value = partition_key_value(document, path);
            request = request.header("x-ms-documentdb-partitionkey", serde_json::to_string(&[value])?);
        }

        ensure_success(STORE, request.send().await?).await?;
        Ok(())
    }
}

/// 依 partition key 路徑（如 `/category`、`/address/city`）取出文件中的值
fn partition_key_value(document: &Value, path: &str) -> Value {
    document
        .pointer(path)
        .cloned()
        .unwrap_or_else(|| json!({}))
}

fn to_record(document: &Value) -> UnifiedRecord {
    UnifiedRecord::CosmosDb(Product {
        id: string_field(document, "id"),
        product: string_field(document, "product"),
        price: f64_field(document, "price"),
        category: string_field(document, "category"),
    })
}

#[async_trait]
impl StoreAccessor for CosmosAccessor {
    type Handle = CosmosClient;

    fn kind(&self) -> DbKind {
        DbKind::CosmosDb
    }

    async fn connect(&self) -> Result<CosmosClient> {
        let raw = required_connection_string(COSMOS_CONNECTION_STRING, &self.connection_string)?;
        CosmosClient::from_connection_string(raw, &self.database, &self.container)
    }

    async fn ensure_seed(&self, client: &mut CosmosClient) -> Result<()> {
        let (peek, _) = client.read_page("1", None).await?;
        if !peek.is_empty() {
            return Ok(());
        }

        let partition_key_path = client.partition_key_path().await?;
        let samples = sample_products();
        tracing::info!(
            "Seeding {} sample items into {} (partition key {:?})",
            samples.len(),
            client.collection_link,
            partition_key_path
        );
        for item in &samples {
            client
                .create_document(item, partition_key_path.as_deref())
                .await?;
        }
        Ok(())
    }

    async fn fetch_all(&self, client: &mut CosmosClient) -> Result<Vec<UnifiedRecord>> {
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let (documents, next) = client.read_page(PAGE_SIZE, continuation.as_deref()).await?;
            records.extend(documents.iter().map(to_record));
            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}
