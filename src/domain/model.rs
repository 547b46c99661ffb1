use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 報表涵蓋的四個資料庫，依報表順序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbKind {
    SqlServer,
    CosmosDb,
    TableStorage,
    Mongodb,
}

impl DbKind {
    pub const ALL: [DbKind; 4] = [
        DbKind::SqlServer,
        DbKind::CosmosDb,
        DbKind::TableStorage,
        DbKind::Mongodb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DbKind::SqlServer => "sql_server",
            DbKind::CosmosDb => "cosmos_db",
            DbKind::TableStorage => "table_storage",
            DbKind::Mongodb => "mongodb",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DbKind::SqlServer => "SQL",
            DbKind::CosmosDb => "Cosmos",
            DbKind::TableStorage => "Table Storage",
            DbKind::Mongodb => "MongoDB",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            DbKind::SqlServer => "relational",
            DbKind::CosmosDb | DbKind::Mongodb => "document_nosql",
            DbKind::TableStorage => "key_value_nosql",
        }
    }

    pub fn failure_message(&self) -> String {
        format!("Failed to fetch {} data", self.display_name())
    }
}

impl std::fmt::Display for DbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub product: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub partition_key: Option<String>,
    pub row_key: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub salary: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
    pub warehouse: Option<String>,
    pub last_updated: Option<String>,
}

/// 任一資料庫的一筆資料，以 `db_type` 標記來源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "db_type", rename_all = "snake_case")]
pub enum UnifiedRecord {
    SqlServer(Customer),
    CosmosDb(Product),
    TableStorage(Employee),
    Mongodb(InventoryItem),
}

impl UnifiedRecord {
    pub fn kind(&self) -> DbKind {
        match self {
            UnifiedRecord::SqlServer(_) => DbKind::SqlServer,
            UnifiedRecord::CosmosDb(_) => DbKind::CosmosDb,
            UnifiedRecord::TableStorage(_) => DbKind::TableStorage,
            UnifiedRecord::Mongodb(_) => DbKind::Mongodb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub details: String,
}

/// 單一 accessor 在一次觸發中的結果
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Records(Vec<UnifiedRecord>),
    Failed(ErrorRecord),
}

impl SourceOutcome {
    pub fn failed(kind: DbKind, details: impl std::fmt::Display) -> Self {
        SourceOutcome::Failed(ErrorRecord {
            error: kind.failure_message(),
            details: details.to_string(),
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }

    /// 失敗時輸出單筆錯誤記錄，維持對外的 JSON 形狀
    pub fn into_entries(self) -> Vec<DataEntry> {
        match self {
            SourceOutcome::Records(records) => {
                records.into_iter().map(DataEntry::Record).collect()
            }
            SourceOutcome::Failed(error) => vec![DataEntry::Error(error)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataEntry {
    Record(UnifiedRecord),
    Error(ErrorRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(rename = "type")]
    pub category: String,
    pub data: Vec<DataEntry>,
    pub count: usize,
}

impl SourceSection {
    pub fn new(kind: DbKind, outcome: SourceOutcome) -> Self {
        let data = outcome.into_entries();
        Self {
            category: kind.category().to_string(),
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    HttpTrigger,
    StorageTrigger,
    TimerTrigger,
}

/// 觸發 storage trigger 的上傳檔
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFile {
    pub name: String,
    pub content_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedReport {
    pub timestamp: DateTime<Utc>,
    pub source: TriggerSource,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trigger_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_content_length: Option<usize>,
    pub databases: BTreeMap<DbKind, SourceSection>,
    pub total_unified_records: usize,
}

impl UnifiedReport {
    pub fn count_for(&self, kind: DbKind) -> usize {
        self.databases.get(&kind).map(|s| s.count).unwrap_or(0)
    }

    pub fn summary(&self) -> TimerSummary {
        TimerSummary {
            timestamp: self.timestamp,
            sql_count: self.count_for(DbKind::SqlServer),
            cosmos_count: self.count_for(DbKind::CosmosDb),
            table_storage_count: self.count_for(DbKind::TableStorage),
            mongodb_count: self.count_for(DbKind::Mongodb),
            total_unified: self.total_unified_records,
            source: self.source,
        }
    }
}

/// 報表的筆數摘要，由 timer trigger 記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSummary {
    pub timestamp: DateTime<Utc>,
    pub sql_count: usize,
    pub cosmos_count: usize,
    pub table_storage_count: usize,
    pub mongodb_count: usize,
    pub total_unified: usize,
    pub source: TriggerSource,
}
