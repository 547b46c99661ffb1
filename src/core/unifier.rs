use crate::adapters::{CosmosAccessor, MongoAccessor, SqlAccessor, TableStorageAccessor};
use crate::config::StoreConfig;
use crate::domain::model::{SourceSection, TriggerSource, UnifiedReport};
use crate::domain::ports::Source;
use chrono::Utc;
use std::collections::BTreeMap;

pub struct Unifier {
    sources: Vec<Box<dyn Source>>,
}

impl Unifier {
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// 四個正式 accessor，依報表順序
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(vec![
            Box::new(SqlAccessor::from_config(config)),
            Box::new(CosmosAccessor::from_config(config)),
            Box::new(TableStorageAccessor::from_config(config)),
            Box::new(MongoAccessor::from_config(config)),
        ])
    }

    /// 依序查詢每個來源並組成報表；不會失敗，出錯的來源以單筆錯誤記錄呈現
    pub async fn unify(&self, source: TriggerSource) -> UnifiedReport {
        tracing::info!("Unifying data from {} sources", self.sources.len());

        let mut databases = BTreeMap::new();
        for store in &self.sources {
            let kind = store.kind();
            let outcome = store.collect().await;
            if outcome.is_failed() {
                tracing::warn!("⚠️ {} contributed an error record", kind);
            }
            let section = SourceSection::new(kind, outcome);
            tracing::debug!("{}: {} entries", kind, section.count);
            databases.insert(kind, section);
        }

        let total_unified_records = databases.values().map(|s| s.count).sum();
        tracing::info!("Unified {} records", total_unified_records);

        UnifiedReport {
            timestamp: Utc::now(),
            source,
            trigger_file: None,
            file_content_length: None,
            databases,
            total_unified_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        Customer, DataEntry, DbKind, InventoryItem, SourceOutcome, UnifiedRecord,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeSource {
        kind: DbKind,
        outcome: SourceOutcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Source for FakeSource {
        fn kind(&self) -> DbKind {
            self.kind
        }

        async fn collect(&self) -> SourceOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn customers(n: i64) -> SourceOutcome {
        SourceOutcome::Records(
            (1..=n)
                .map(|id| {
                    UnifiedRecord::SqlServer(Customer {
                        id,
                        name: None,
                        email: None,
                        city: None,
                    })
                })
                .collect(),
        )
    }

    fn inventory(n: usize) -> SourceOutcome {
        SourceOutcome::Records(
            (0..n)
                .map(|i| {
                    UnifiedRecord::Mongodb(InventoryItem {
                        id: Some(format!("inv{:03}", i + 1)),
                        item: None,
                        quantity: None,
                        warehouse: None,
                        last_updated: None,
                    })
                })
                .collect(),
        )
    }

    fn fake(kind: DbKind, outcome: SourceOutcome, calls: &Arc<AtomicUsize>) -> Box<dyn Source> {
        Box::new(FakeSource {
            kind,
            outcome,
            calls: Arc::clone(calls),
        })
    }

    #[tokio::test]
    async fn test_total_is_sum_of_counts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unifier = Unifier::new(vec![
            fake(DbKind::SqlServer, customers(4), &calls),
            fake(DbKind::CosmosDb, SourceOutcome::Records(vec![]), &calls),
            fake(DbKind::TableStorage, SourceOutcome::failed(DbKind::TableStorage, "down"), &calls),
            fake(DbKind::Mongodb, inventory(4), &calls),
        ]);

        let report = unifier.unify(TriggerSource::HttpTrigger).await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.count_for(DbKind::SqlServer), 4);
        assert_eq!(report.count_for(DbKind::CosmosDb), 0);
        assert_eq!(report.count_for(DbKind::TableStorage), 1);
        assert_eq!(report.count_for(DbKind::Mongodb), 4);
        assert_eq!(report.total_unified_records, 9);
        assert_eq!(
            report.total_unified_records,
            report.databases.values().map(|s| s.count).sum::<usize>()
        );
        for section in report.databases.values() {
            assert_eq!(section.count, section.data.len());
        }
    }

    #[tokio::test]
    async fn test_all_sources_failing_still_produces_report() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unifier = Unifier::new(
            DbKind::ALL
                .iter()
                .map(|kind| fake(*kind, SourceOutcome::failed(*kind, "unreachable"), &calls))
                .collect(),
        );

        let report = unifier.unify(TriggerSource::TimerTrigger).await;

        assert_eq!(report.total_unified_records, 4);
        let sql = &report.databases[&DbKind::SqlServer];
        assert!(matches!(&sql.data[0], DataEntry::Error(e) if e.error == "Failed to fetch SQL data"));
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unifier = Unifier::new(vec![fake(DbKind::SqlServer, customers(1), &calls)]);

        let report = unifier.unify(TriggerSource::HttpTrigger).await;
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["source"], "http_trigger");
        assert_eq!(value["databases"]["sql_server"]["type"], "relational");
        assert_eq!(value["databases"]["sql_server"]["count"], 1);
        assert_eq!(value["databases"]["sql_server"]["data"][0]["db_type"], "sql_server");
        assert_eq!(value["total_unified_records"], 1);
        assert!(value.get("trigger_file").is_none());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_from_config_builds_four_sources_in_order() {
        let unifier = Unifier::from_config(&StoreConfig::default());
        let kinds: Vec<DbKind> = unifier.sources.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, DbKind::ALL.to_vec());
    }
}
