use crate::config::{StoreConfig, MONGODB_CONNECTION_STRING};
use crate::domain::model::{DbKind, InventoryItem, UnifiedRecord};
use crate::domain::ports::StoreAccessor;
use crate::utils::error::Result;
use crate::utils::validation::required_connection_string;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};

/// 次要文件資料庫：MongoDB 的 `inventory` collection
#[derive(Debug, Clone)]
pub struct MongoAccessor {
    connection_string: Option<String>,
    database: String,
    collection: String,
}

impl MongoAccessor {
    pub fn new(connection_string: Option<String>, database: String, collection: String) -> Self {
        Self {
            connection_string,
            database,
            collection,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            config.mongodb_connection_string.clone(),
            config.mongodb_database.clone(),
            config.mongodb_collection.clone(),
        )
    }
}

pub struct MongoHandle {
    client: Client,
    collection: Collection<Document>,
}

fn sample_inventory() -> Vec<Document> {
    vec![
        doc! {"_id": "inv001", "item": "Widget A", "quantity": 150, "warehouse": "North", "last_updated": "2024-01-15"},
        doc! {"_id": "inv002", "item": "Widget B", "quantity": 75, "warehouse": "South", "last_updated": "2024-01-16"},
        doc! {"_id": "inv003", "item": "Gadget X", "quantity": 200, "warehouse": "East", "last_updated": "2024-01-17"},
        doc! {"_id": "inv004", "item": "Gadget Y", "quantity": 50, "warehouse": "West", "last_updated": "2024-01-18"},
    ]
}

fn bson_string(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::String(s) => Some(s.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        Bson::DateTime(dt) => dt.try_to_rfc3339_string().ok(),
        Bson::Null | Bson::Undefined => None,
        other => Some(other.to_string()),
    }
}

fn bson_i64(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        Bson::Double(d) if d.fract() == 0.0 => Some(*d as i64),
        _ => None,
    }
}

fn to_record(document: &Document) -> UnifiedRecord {
    UnifiedRecord::Mongodb(InventoryItem {
        id: bson_string(document.get("_id")),
        item: bson_string(document.get("item")),
        quantity: bson_i64(document.get("quantity")),
        warehouse: bson_string(document.get("warehouse")),
        last_updated: bson_string(document.get("last_updated")),
    })
}

/// 集合的最小操作集合，種子邏輯只依賴這三個動作
#[async_trait]
trait DocumentCollection: Send + Sync {
    async fn count(&self) -> Result<u64>;
    async fn insert(&self, documents: Vec<Document>) -> Result<()>;
    async fn find_all(&self) -> Result<Vec<Document>>;
}

#[async_trait]
impl DocumentCollection for Collection<Document> {
    async fn count(&self) -> Result<u64> {
        Ok(self.count_documents(doc! {}).await?)
    }

    async fn insert(&self, documents: Vec<Document>) -> Result<()> {
        self.insert_many(documents).await?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Document>> {
        let cursor = self.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }
}

/// 集合為空時寫入樣本文件，回傳寫入筆數
async fn seed_if_empty<C: DocumentCollection + ?Sized>(collection: &C) -> Result<usize> {
    if collection.count().await? > 0 {
        return Ok(0);
    }

    let samples = sample_inventory();
    let inserted = samples.len();
    collection.insert(samples).await?;
    Ok(inserted)
}

#[async_trait]
impl StoreAccessor for MongoAccessor {
    type Handle = MongoHandle;

    fn kind(&self) -> DbKind {
        DbKind::Mongodb
    }

    async fn connect(&self) -> Result<MongoHandle> {
        let uri = required_connection_string(MONGODB_CONNECTION_STRING, &self.connection_string)?;
        let client = Client::with_uri_str(uri).await?;
        let collection = client
            .database(&self.database)
            .collection::<Document>(&self.collection);
        Ok(MongoHandle { client, collection })
    }

    async fn ensure_seed(&self, handle: &mut MongoHandle) -> Result<()> {
        let inserted = seed_if_empty(&handle.collection).await?;
        if inserted > 0 {
            tracing::info!(
                "Seeded {} sample documents into {}.{}",
                inserted,
                self.database,
                self.collection
            );
        }
        Ok(())
    }

    async fn fetch_all(&self, handle: &mut MongoHandle) -> Result<Vec<UnifiedRecord>> {
        let documents = handle.collection.find_all().await?;
        Ok(documents.iter().map(to_record).collect())
    }

    async fn close(&self, handle: MongoHandle) {
        handle.client.shutdown().await;
    }
}
