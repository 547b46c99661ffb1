use crate::utils::error::{Result, UnifyError};
use reqwest::Response;
use serde_json::Value;

/// 非 2xx 回應轉為帶有服務錯誤訊息的 `StoreError`
pub async fn ensure_success(store: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("{} error body: {}", store, body);
    Err(UnifyError::StoreError {
        store: store.to_string(),
        status: status.as_u16(),
        message: error_message(&body),
    })
}

// Cosmos 與 Table 的錯誤格式不同，盡量取出可讀訊息
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/odata.error/message/value").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

pub fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

pub fn i64_field(value: &Value, key: &str) -> Option<i64> {
    let field = value.get(key)?;
    field
        .as_i64()
        .or_else(|| field.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_formats() {
        assert_eq!(error_message(r#"{"code":"NotFound","message":"Resource missing"}"#), "Resource missing");
        assert_eq!(
            error_message(r#"{"odata.error":{"code":"TableNotFound","message":{"lang":"en-US","value":"The table specified does not exist."}}}"#),
            "The table specified does not exist."
        );
        assert_eq!(error_message(" plain text "), "plain text");
    }

    #[test]
    fn test_field_helpers() {
        let doc = json!({"id": 7, "name": "Desk", "price": 299.99, "salary": "85000", "flag": null});
        assert_eq!(string_field(&doc, "id").as_deref(), Some("7"));
        assert_eq!(string_field(&doc, "name").as_deref(), Some("Desk"));
        assert_eq!(string_field(&doc, "flag"), None);
        assert_eq!(f64_field(&doc, "price"), Some(299.99));
        assert_eq!(i64_field(&doc, "salary"), Some(85000));
        assert_eq!(i64_field(&doc, "missing"), None);
    }
}
