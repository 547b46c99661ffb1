use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Functions host 轉送請求時附帶的呼叫識別碼標頭
pub const INVOCATION_ID_HEADER: &str = "x-azure-functions-invocationid";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "unify_functions=debug,info"
    } else {
        "unify_functions=info"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 給 Functions host 收集的 JSON 日誌，每行帶上目前 invocation span 的欄位
pub fn init_handler_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();
}

/// 單次觸發的 span；沒有識別碼時記為 `local`
pub fn invocation_span(function: &'static str, invocation_id: Option<&str>) -> Span {
    tracing::info_span!(
        "invocation",
        function,
        invocation_id = invocation_id.unwrap_or("local")
    )
}
