#[cfg(feature = "cli")]
pub mod cli;
pub mod connection_string;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use std::env;
use std::time::Duration;

pub const SQL_CONNECTION_STRING: &str = "SQL_CONNECTION_STRING";
pub const COSMOS_CONNECTION_STRING: &str = "COSMOS_CONNECTION_STRING";
pub const TABLE_STORAGE_CONNECTION_STRING: &str = "TABLE_STORAGE_CONNECTION_STRING";
pub const MONGODB_CONNECTION_STRING: &str = "MONGODB_CONNECTION_STRING";

/// 四個資料庫的連線字串與名稱
///
/// 每次觸發時重新建立（見 [`StoreConfig::from_env`]）再交給 unifier，accessor 本身不讀環境變數
#[derive(Clone)]
pub struct StoreConfig {
    pub sql_connection_string: Option<String>,
    pub cosmos_connection_string: Option<String>,
    pub table_storage_connection_string: Option<String>,
    pub mongodb_connection_string: Option<String>,
    pub cosmos_database: String,
    pub cosmos_container: String,
    pub table_name: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sql_connection_string: None,
            cosmos_connection_string: None,
            table_storage_connection_string: None,
            mongodb_connection_string: None,
            cosmos_database: "database2".to_string(),
            cosmos_container: "items".to_string(),
            table_name: "employees".to_string(),
            mongodb_database: "inventorydb".to_string(),
            mongodb_collection: "inventory".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 以任意查找函式建立配置，測試時不必修改行程環境變數
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let named = |name: &str, default: String| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        Self {
            sql_connection_string: lookup(SQL_CONNECTION_STRING),
            cosmos_connection_string: lookup(COSMOS_CONNECTION_STRING),
            table_storage_connection_string: lookup(TABLE_STORAGE_CONNECTION_STRING),
            mongodb_connection_string: lookup(MONGODB_CONNECTION_STRING),
            cosmos_database: named("COSMOS_DATABASE", defaults.cosmos_database),
            cosmos_container: named("COSMOS_CONTAINER", defaults.cosmos_container),
            table_name: named("TABLE_NAME", defaults.table_name),
            mongodb_database: named("MONGODB_DATABASE", defaults.mongodb_database),
            mongodb_collection: named("MONGODB_COLLECTION", defaults.mongodb_collection),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("StoreConfig")
            .field("sql_connection_string", &state(&self.sql_connection_string))
            .field("cosmos_connection_string", &state(&self.cosmos_connection_string))
            .field(
                "table_storage_connection_string",
                &state(&self.table_storage_connection_string),
            )
            .field("mongodb_connection_string", &state(&self.mongodb_connection_string))
            .field("cosmos_database", &self.cosmos_database)
            .field("cosmos_container", &self.cosmos_container)
            .field("table_name", &self.table_name)
            .field("mongodb_database", &self.mongodb_database)
            .field("mongodb_collection", &self.mongodb_collection)
            .finish()
    }
}

/// custom handler HTTP 伺服器設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub standalone_timer: bool,
    pub timer_interval_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            standalone_timer: false,
            timer_interval_minutes: 30,
        }
    }
}

impl ServerConfig {
    pub fn timer_interval(&self) -> Duration {
        Duration::from_secs(self.timer_interval_minutes * 60)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        if self.standalone_timer {
            validate_range("timer_interval_minutes", self.timer_interval_minutes, 1, 24 * 60)?;
        }

        tracing::debug!("✅ Server configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_server_config_validation() {
        assert!(ServerConfig::default().validate().is_ok());

        let zero_port = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(zero_port.validate().is_err());

        let bad_interval = ServerConfig {
            standalone_timer: true,
            timer_interval_minutes: 0,
            ..ServerConfig::default()
        };
        assert!(bad_interval.validate().is_err());
        assert_eq!(ServerConfig::default().timer_interval(), Duration::from_secs(1800));
    }

    #[test]
    fn test_from_lookup_uses_defaults_for_names() {
        let vars: HashMap<&str, &str> = [
            (SQL_CONNECTION_STRING, "sqlite::memory:"),
            ("TABLE_NAME", "staff"),
            ("COSMOS_DATABASE", "  "),
        ]
        .into_iter()
        .collect();

        let config = StoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.sql_connection_string.as_deref(), Some("sqlite::memory:"));
        assert!(config.cosmos_connection_string.is_none());
        assert_eq!(config.table_name, "staff");
        assert_eq!(config.cosmos_database, "database2");
        assert_eq!(config.mongodb_collection, "inventory");
    }

    #[test]
    fn test_debug_hides_connection_strings() {
        let config = StoreConfig {
            cosmos_connection_string: Some("AccountKey=secret".to_string()),
            ..StoreConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<set>"));
    }
}
