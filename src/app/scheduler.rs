use crate::app::triggers::{timer_trigger, UnifierFactory};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 行程內的計時觸發，取代 host 的 timer trigger
///
/// 第一個 tick 立即完成，啟動時即執行一次
pub fn spawn_timer(unifiers: UnifierFactory, every: Duration) -> JoinHandle<()> {
    tracing::info!("⏰ Standalone timer enabled, every {:?}", every);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let unifier = unifiers();
            timer_trigger(&unifier).await;
        }
    })
}
