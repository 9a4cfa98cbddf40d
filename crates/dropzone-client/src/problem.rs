//! Classification of non-success responses.

use dropzone_core::ServiceError;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// Error body shapes the API returns.
#[derive(Debug, Default, Deserialize)]
struct ProblemBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProblemBody {
    fn into_message(self) -> Option<String> {
        self.error
            .or(self.detail)
            .or(self.message)
            .filter(|message| !message.trim().is_empty())
    }
}

/// Turn a non-success response into a [`ServiceError`].
pub async fn classify_problem(operation: &'static str, response: Response) -> ServiceError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ProblemBody>(&bytes)
        .ok()
        .and_then(ProblemBody::into_message)
        .or_else(|| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            (!text.is_empty()).then_some(text)
        });

    tracing::debug!(operation, status = status.as_u16(), "request rejected");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ServiceError::AccessDenied { operation, message }
        }
        StatusCode::NOT_FOUND => ServiceError::NotFound { operation },
        _ => ServiceError::Status {
            operation,
            status: status.as_u16(),
            message: message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        },
    }
}
