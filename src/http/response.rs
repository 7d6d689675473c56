//! Rejection responses and rate-limit response metadata.

use axum::http::header::{HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::admission::AdmissionError;
use crate::security::RateLimitInfo;

pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";
pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";

/// Attach rate-limit metadata to a response counted by the limiter.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(info.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(info.reset_secs));
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(info.limit));
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdmissionError::NetworkBlocked { .. } | AdmissionError::InvalidToken(_) => {
                StatusCode::FORBIDDEN
            }
            AdmissionError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        };
        let message = self.to_string();

        let mut response = (status, message).into_response();
        if let AdmissionError::RateLimitExceeded {
            retry_after_secs,
            limit,
            ..
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
            headers.insert(X_RATELIMIT_RESET, HeaderValue::from(retry_after_secs));
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert("retry-after", HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::TokenError;

    #[test]
    fn test_status_mapping() {
        let blocked = AdmissionError::NetworkBlocked {
            message: "a banned range".to_string(),
        }
        .into_response();
        assert_eq!(blocked.status(), StatusCode::FORBIDDEN);

        let invalid = AdmissionError::InvalidToken(TokenError::OriginMismatch {
            claimed: "a".into(),
            computed: "b".into(),
        })
        .into_response();
        assert_eq!(invalid.status(), StatusCode::FORBIDDEN);

        let limited = AdmissionError::RateLimitExceeded {
            retry_after_secs: 120,
            period_secs: 3600,
            limit: 10,
        }
        .into_response();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers()[X_RATELIMIT_REMAINING], "0");
        assert_eq!(limited.headers()[X_RATELIMIT_LIMIT], "10");
        assert_eq!(limited.headers()["retry-after"], "120");
    }
}
