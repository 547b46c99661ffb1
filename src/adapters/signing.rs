//! Cosmos 與 Table REST adapter 共用的 HMAC-SHA256 請求簽章

use crate::utils::error::{Result, UnifyError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use ring::hmac;

/// 從連線字串的 base64 形式解碼的帳號金鑰
#[derive(Clone)]
pub struct AccountKey(hmac::Key);

impl AccountKey {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| UnifyError::SigningError {
                message: format!("Account key is not valid base64: {}", e),
            })?;
        Ok(Self(hmac::Key::new(hmac::HMAC_SHA256, &raw)))
    }

    pub fn sign(&self, payload: &str) -> String {
        let tag = hmac::sign(&self.0, payload.as_bytes());
        STANDARD.encode(tag.as_ref())
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccountKey(***)")
    }
}

/// `x-ms-date` 使用的 RFC 1123 日期
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cosmos DB master key 請求的 `authorization` 標頭
pub fn cosmos_master_token(
    key: &AccountKey,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );
    let token = format!("type=master&ver=1.0&sig={}", key.sign(&payload));
    url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
}

/// Table 服務 `SharedKeyLite` 請求的 `Authorization` 標頭
pub fn table_shared_key_lite(
    key: &AccountKey,
    account: &str,
    canonical_path: &str,
    date: &str,
) -> String {
    let string_to_sign = format!("{}\n/{}{}", date, account, canonical_path);
    format!("SharedKeyLite {}:{}", account, key.sign(&string_to_sign))
}
