// Adapters layer: one `StoreAccessor` per external store, plus the REST plumbing they share.

pub mod cosmos;
pub mod mongo;
pub mod mssql;
pub mod rest;
pub mod signing;
pub mod sql;
pub mod table_storage;

pub use cosmos::CosmosAccessor;
pub use mongo::MongoAccessor;
pub use sql::SqlAccessor;
pub use table_storage::TableStorageAccessor;
