pub mod unifier;

pub use crate::domain::model::{SourceOutcome, TriggerSource, UnifiedReport};
pub use crate::domain::ports::{Source, StoreAccessor};
pub use crate::utils::error::Result;
