pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use app::server::{router, AppState};
pub use config::{ServerConfig, StoreConfig};
pub use crate::core::unifier::Unifier;
pub use domain::model::{DbKind, TriggerSource, UnifiedReport};
pub use utils::error::{Result, UnifyError};
