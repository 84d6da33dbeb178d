//! Blocking HTTP plumbing shared by every provider.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

use super::provider::DataError;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Build the blocking client every provider uses.
pub fn build_client(timeout: Duration) -> Result<Client, DataError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))
}

/// Map a transport failure onto the provider error taxonomy.
pub fn transport_error(e: reqwest::Error) -> DataError {
    if e.is_timeout() {
        DataError::NetworkUnreachable(format!("request timed out: {e}"))
    } else {
        DataError::NetworkUnreachable(e.to_string())
    }
}

/// Pass a success response through; turn anything else into a `DataError`.
pub fn check_status(resp: Response, symbol: &str) -> Result<Response, DataError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(|v| format!("retry after {v}s"))
                .unwrap_or_else(|| "HTTP 429".to_string());
            Err(DataError::RateLimited(retry_after))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DataError::AuthenticationRequired(
            format!("HTTP {status} for {symbol}"),
        )),
        StatusCode::NOT_FOUND => Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }),
        _ => Err(DataError::HttpStatus {
            status: status.as_u16(),
            body: resp.text().unwrap_or_default(),
        }),
    }
}
