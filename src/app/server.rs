//! Azure Functions custom handler
//!
//! HTTP 觸發以原始請求轉送（`enableForwardingHttpRequest`），
//! blob 與 timer 觸發則以 JSON invocation envelope POST 到 `/<function name>`

use crate::app::triggers::{
    env_unifier_factory, http_trigger, storage_trigger, timer_trigger, UnifierFactory,
};
use crate::config::ServerConfig;
use crate::domain::model::TriggerFile;
use crate::utils::error::Result;
use crate::utils::logger::{invocation_span, INVOCATION_ID_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::Instrument;

/// Blob trigger 監看的容器路徑（function_app/unify_data_storage/function.json）
pub const UPLOAD_CONTAINER: &str = "uploads";

#[derive(Clone)]
pub struct AppState {
    unifiers: UnifierFactory,
}

impl AppState {
    pub fn new(unifiers: UnifierFactory) -> Self {
        Self { unifiers }
    }

    pub fn from_env() -> Self {
        Self::new(env_unifier_factory())
    }

    pub fn unifiers(&self) -> UnifierFactory {
        self.unifiers.clone()
    }
}

/// 非 HTTP 觸發時 host 送來的 payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeRequest {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeResponse {
    pub outputs: Map<String, Value>,
    pub logs: Vec<String>,
    pub return_value: Option<Value>,
}

impl InvokeResponse {
    fn logged(line: String) -> Self {
        Self {
            outputs: Map::new(),
            logs: vec![line],
            return_value: None,
        }
    }
}

impl InvokeRequest {
    /// 綁定為 `myblob` 的上傳檔名稱與位元組長度
    ///
    /// 名稱含容器路徑（`uploads/report.csv`）：優先使用 `BlobTrigger`，只有 `name` 時補上容器前綴
    pub fn trigger_file(&self) -> TriggerFile {
        let metadata = |key: &str| self.metadata.get(key).and_then(Value::as_str);

        let name = match metadata("BlobTrigger") {
            Some(path) => path.to_string(),
            None => match metadata("name").or_else(|| metadata("Name")) {
                Some(name) => format!("{}/{}", UPLOAD_CONTAINER, name),
                None => "unknown".to_string(),
            },
        };

        let content_length = match self.data.get("myblob") {
            Some(Value::String(content)) => content.len(),
            Some(Value::Null) | None => 0,
            Some(other) => other.to_string().len(),
        };

        TriggerFile {
            name,
            content_length,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/unify-data", get(unify_data_http).post(unify_data_http))
        .route("/unify_data_storage", post(unify_data_storage))
        .route("/scheduled_unify", post(scheduled_unify))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// 序列化報表；序列化失敗是唯一回傳 500 的情況
pub fn json_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error in HTTP trigger: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                json!({ "error": e.to_string() }).to_string(),
            )
                .into_response()
        }
    }
}

fn invocation_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(INVOCATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

async fn unify_data_http(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let span = invocation_span("unify_data_http", invocation_id(&headers));
    let unifier = (state.unifiers)();
    let report = http_trigger(&unifier).instrument(span).await;
    json_response(&report)
}

async fn unify_data_storage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InvokeRequest>,
) -> Json<InvokeResponse> {
    let span = invocation_span("unify_data_storage", invocation_id(&headers));
    let unifier = (state.unifiers)();
    let report = storage_trigger(&unifier, request.trigger_file())
        .instrument(span)
        .await;

    Json(InvokeResponse::logged(format!(
        "Unified data from {} databases: {} total records",
        report.databases.len(),
        report.total_unified_records
    )))
}

// 計時器的 payload 只用於記錄，格式不符時仍照常執行
async fn scheduled_unify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<InvokeResponse> {
    let span = invocation_span("scheduled_unify", invocation_id(&headers));
    let request: InvokeRequest = serde_json::from_slice(&body).unwrap_or_default();
    if let Some(timer) = request.data.get("myTimer") {
        if timer.get("IsPastDue").and_then(Value::as_bool) == Some(true) {
            span.in_scope(|| tracing::warn!("Timer invocation is running late"));
        }
    }

    let unifier = (state.unifiers)();
    let summary = timer_trigger(&unifier).instrument(span).await;

    Json(InvokeResponse::logged(format!(
        "Scheduled unification completed: {}",
        serde_json::to_string(&summary).unwrap_or_default()
    )))
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("🚀 Custom handler listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
