use crate::config::StoreConfig;
use crate::core::unifier::Unifier;
use crate::domain::model::{TimerSummary, TriggerFile, TriggerSource, UnifiedReport};
use std::sync::Arc;

/// 每次觸發建立新的 unifier
pub type UnifierFactory = Arc<dyn Fn() -> Unifier + Send + Sync>;

/// 每次呼叫時從環境變數讀取資料庫設定
pub fn env_unifier_factory() -> UnifierFactory {
    Arc::new(|| Unifier::from_config(&StoreConfig::from_env()))
}

pub async fn http_trigger(unifier: &Unifier) -> UnifiedReport {
    tracing::info!("HTTP trigger function processed a request.");
    unifier.unify(TriggerSource::HttpTrigger).await
}

/// 新檔案上傳時執行，只使用檔名與大小
pub async fn storage_trigger(unifier: &Unifier, file: TriggerFile) -> UnifiedReport {
    tracing::info!("Storage trigger function processed blob: {}", file.name);

    let mut report = unifier.unify(TriggerSource::StorageTrigger).await;
    report.trigger_file = Some(file.name);
    report.file_content_length = Some(file.content_length);

    tracing::info!(
        "Unified data from {} databases: {} total records",
        report.databases.len(),
        report.total_unified_records
    );
    report
}

pub async fn timer_trigger(unifier: &Unifier) -> TimerSummary {
    tracing::info!("Timer trigger function executed.");

    let summary = unifier.unify(TriggerSource::TimerTrigger).await.summary();
    tracing::info!(
        sql_count = summary.sql_count,
        cosmos_count = summary.cosmos_count,
        table_storage_count = summary.table_storage_count,
        mongodb_count = summary.mongodb_count,
        total_unified = summary.total_unified,
        "Scheduled unification completed"
    );
    summary
}
