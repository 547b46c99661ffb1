use crate::domain::model::{DbKind, SourceOutcome, UnifiedRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 寫入樣本資料失敗時是否中止整個 accessor 呼叫
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    Required,
    BestEffort,
}

/// 單一資料庫的 connect / seed / fetch / close 流程
///
/// `Handle` 是一次呼叫中各步驟共用的連線：資料庫連線、簽章 HTTP client 或 driver client
#[async_trait]
pub trait StoreAccessor: Send + Sync {
    type Handle: Send;

    fn kind(&self) -> DbKind;

    fn seed_policy(&self) -> SeedPolicy {
        SeedPolicy::BestEffort
    }

    async fn connect(&self) -> Result<Self::Handle>;

    /// 必要時建立結構，資料庫為空時寫入樣本資料
    async fn ensure_seed(&self, handle: &mut Self::Handle) -> Result<()>;

    async fn fetch_all(&self, handle: &mut Self::Handle) -> Result<Vec<UnifiedRecord>>;

    async fn close(&self, _handle: Self::Handle) {}
}

/// 給 unifier 使用的 object-safe accessor 介面
#[async_trait]
pub trait Source: Send + Sync {
    fn kind(&self) -> DbKind;

    /// 不會失敗：錯誤以 `SourceOutcome::Failed` 回傳
    async fn collect(&self) -> SourceOutcome;
}

#[async_trait]
impl<A: StoreAccessor> Source for A {
    fn kind(&self) -> DbKind {
        StoreAccessor::kind(self)
    }

    async fn collect(&self) -> SourceOutcome {
        let kind = StoreAccessor::kind(self);
        match run_accessor(self).await {
            Ok(records) => {
                tracing::debug!("{} returned {} records", kind, records.len());
                SourceOutcome::Records(records)
            }
            Err(e) => {
                tracing::error!("Error getting {} data: {}", kind.display_name(), e);
                SourceOutcome::failed(kind, e)
            }
        }
    }
}

async fn run_accessor<A: StoreAccessor + ?Sized>(accessor: &A) -> Result<Vec<UnifiedRecord>> {
    let mut handle = accessor.connect().await?;

    if let Err(e) = accessor.ensure_seed(&mut handle).await {
        match accessor.seed_policy() {
            SeedPolicy::Required => {
                accessor.close(handle).await;
                return Err(e);
            }
            SeedPolicy::BestEffort => {
                tracing::warn!("Could not insert sample data: {}", e);
            }
        }
    }

    let fetched = accessor.fetch_all(&mut handle).await;
    accessor.close(handle).await;
    fetched
}
