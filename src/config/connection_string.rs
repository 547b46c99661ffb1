use crate::utils::error::{Result, UnifyError};
use std::collections::HashMap;

/// 解析後的 `Key=Value;Key=Value` 連線字串
///
/// 鍵不分大小寫；值保留第一個 `=` 之後的全部內容（含 base64 補位）
#[derive(Debug, Clone, Default)]
pub struct ConnectionString {
    pairs: HashMap<String, String>,
}

impl ConnectionString {
    pub fn parse(field_name: &str, raw: &str) -> Result<Self> {
        let mut pairs = HashMap::new();

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = segment.split_once('=').ok_or_else(|| {
                UnifyError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: redact(raw),
                    reason: format!("Segment '{}' is not in Key=Value form", key_of(segment)),
                }
            })?;

            pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if pairs.is_empty() {
            return Err(UnifyError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: String::new(),
                reason: "Connection string has no Key=Value segments".to_string(),
            });
        }

        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn require(&self, field_name: &str, key: &str) -> Result<&str> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UnifyError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: key.to_string(),
                reason: format!("Connection string is missing '{}'", key),
            })
    }
}

fn key_of(segment: &str) -> &str {
    segment.split('=').next().unwrap_or(segment)
}

// 錯誤訊息中不輸出帳號金鑰
fn redact(raw: &str) -> String {
    raw.split(';')
        .map(|segment| match segment.split_once('=') {
            Some((key, _)) if key.trim().eq_ignore_ascii_case("AccountKey") => {
                format!("{}=***", key)
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
