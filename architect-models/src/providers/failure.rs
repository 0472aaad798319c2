//! Mapping of provider HTTP failures onto [`ErrorKind`].

use serde_json::Value;

use crate::error::{ErrorKind, ProviderError, QuotaKind};
use crate::transport::TransportError;

const AUTH_SIGNALS: &[&str] = &[
    "api_key_invalid",
    "api key not valid",
    "api key not found",
    "invalid api key",
    "invalid_api_key",
    "incorrect api key",
];

const EXHAUSTED_SIGNALS: &[&str] = &[
    "insufficient_quota",
    "insufficient balance",
    "insufficient_balance",
    "billing",
    "credits",
];

// Checked before the exhausted markers: Gemini mentions billing even for
// per-minute limits but then tells the caller when to retry.
const RETRY_LATER_SIGNALS: &[&str] = &["retry in", "retrydelay", "try again in", "rate limit"];

const MODEL_GONE_SIGNALS: &[&str] = &[
    "model_decommissioned",
    "decommissioned",
    "model_not_found",
    "does not exist",
    "not found for api version",
    "is not supported for generatecontent",
];

/// Extract a human-readable message from a provider error body.
///
/// Both Gemini and OpenAI-compatible APIs nest it under `error.message`;
/// anything else is returned trimmed as-is.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Classify a non-success HTTP response.
pub(crate) fn classify_status(provider: &str, status: u16, body: &str) -> ProviderError {
    let message = error_message(body);
    let signals = body.to_lowercase();
    let any = |markers: &[&str]| markers.iter().any(|m| signals.contains(m));

    let kind = match status {
        401 | 403 => ErrorKind::AuthenticationError,
        402 => ErrorKind::QuotaExceeded(QuotaKind::Exhausted),
        429 if any(RETRY_LATER_SIGNALS) => ErrorKind::QuotaExceeded(QuotaKind::Transient),
        429 if any(EXHAUSTED_SIGNALS) => ErrorKind::QuotaExceeded(QuotaKind::Exhausted),
        429 => ErrorKind::QuotaExceeded(QuotaKind::Transient),
        404 => ErrorKind::UnsupportedModel,
        _ if any(AUTH_SIGNALS) => ErrorKind::AuthenticationError,
        _ if any(MODEL_GONE_SIGNALS) => ErrorKind::UnsupportedModel,
        _ => ErrorKind::UnknownError,
    };

    let message = if message.is_empty() {
        format!("{provider} returned HTTP {status}")
    } else {
        format!("{provider} returned HTTP {status}: {message}")
    };
    ProviderError::new(kind, message)
}

/// Classify a failure to complete the round trip.
pub(crate) fn classify_transport(provider: &str, err: TransportError) -> ProviderError {
    ProviderError::network(format!("{provider}: {err}"))
}

/// A 2xx response whose body did not have the expected shape.
pub(crate) fn unexpected_body(provider: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::unknown(format!("unexpected response from {provider}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_authentication_error() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = classify_status("groq", 401, body);
        assert_eq!(err.kind, ErrorKind::AuthenticationError);
        assert_eq!(err.message, "groq returned HTTP 401: Invalid API Key");
    }

    #[test]
    fn gemini_bad_key_400_is_authentication_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = classify_status("gemini", 400, body);
        assert_eq!(err.kind, ErrorKind::AuthenticationError);
    }

    #[test]
    fn rate_limit_is_transient_quota() {
        let body = r#"{"error":{"message":"Rate limit reached for model","type":"tokens","code":"rate_limit_exceeded"}}"#;
        let err = classify_status("groq", 429, body);
        assert_eq!(err.kind, ErrorKind::QuotaExceeded(QuotaKind::Transient));
    }

    #[test]
    fn insufficient_quota_is_exhausted() {
        let body = r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#;
        let err = classify_status("xai", 429, body);
        assert_eq!(err.kind, ErrorKind::QuotaExceeded(QuotaKind::Exhausted));
    }

    #[test]
    fn gemini_per_minute_limit_with_retry_hint_is_transient() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota, please check your plan and billing details. Please retry in 39.2s.","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify_status("gemini", 429, body);
        assert_eq!(err.kind, ErrorKind::QuotaExceeded(QuotaKind::Transient));
    }

    #[test]
    fn payment_required_is_exhausted() {
        let body = r#"{"error":{"message":"Insufficient Balance","type":"unknown_error"}}"#;
        let err = classify_status("deepseek", 402, body);
        assert_eq!(err.kind, ErrorKind::QuotaExceeded(QuotaKind::Exhausted));
    }

    #[test]
    fn decommissioned_model_is_unsupported_model() {
        let body = r#"{"error":{"message":"The model `mixtral-8x7b-32768` has been decommissioned and is no longer supported.","type":"invalid_request_error","code":"model_decommissioned"}}"#;
        let err = classify_status("groq", 400, body);
        assert_eq!(err.kind, ErrorKind::UnsupportedModel);
    }

    #[test]
    fn not_found_is_unsupported_model() {
        let body = r#"{"error":{"code":404,"message":"models/gemini-pro is not found for API version v1beta","status":"NOT_FOUND"}}"#;
        let err = classify_status("gemini", 404, body);
        assert_eq!(err.kind, ErrorKind::UnsupportedModel);
        assert!(err.message.contains("gemini-pro"));
    }

    #[test]
    fn server_error_is_unknown_with_raw_message() {
        let err = classify_status("xai", 500, "upstream exploded");
        assert_eq!(err.kind, ErrorKind::UnknownError);
        assert_eq!(err.message, "xai returned HTTP 500: upstream exploded");
    }

    #[test]
    fn empty_body_still_names_status() {
        let err = classify_status("groq", 503, "");
        assert_eq!(err.message, "groq returned HTTP 503");
    }

    #[test]
    fn transport_failure_is_network_error() {
        let err = classify_transport("gemini", TransportError::Timeout);
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert_eq!(err.message, "gemini: request timed out");
    }
}
