//! Pure classification of HTTP outcomes into [`ApiError`]
//!
//! These functions never perform I/O: the response body is read by the
//! caller and passed in as text. They are tested purely via input/output
//! pairs.

use crate::errors::ApiError;

/// Classify a non-success HTTP response into a typed error.
///
/// 401 responses become [`ApiError::Auth`]; everything else becomes
/// [`ApiError::Http`] with a message enriched for the caller. The raw body
/// is preserved for diagnostics whenever it is non-empty.
pub fn classify_status(status: u16, body: &str) -> ApiError {
    let server_message = extract_server_message(body);
    let raw_body = if body.is_empty() { None } else { Some(body.to_string()) };

    if status == 401 {
        let message = server_message
            .unwrap_or_else(|| format!("HTTP {status}: {}", status_reason(status)));
        return ApiError::Auth { message, status, body: raw_body };
    }

    ApiError::Http {
        message: enrich_message(status, server_message.as_deref()),
        status,
        body: raw_body,
    }
}

/// Extract a server-supplied `message` or `error` field from a JSON body.
///
/// Returns `None` when the body is not parseable JSON or carries neither
/// field as a string.
pub fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|field| field.as_str())
        .map(str::to_string)
}

/// Human message for a session that could not be re-authenticated.
///
/// Distinguishes an expired session from a generically invalid one by
/// substring match on the server-provided message.
pub fn auth_failure_message(server_message: Option<&str>) -> String {
    match server_message {
        Some(msg) if msg.to_lowercase().contains("expired") => {
            "Your session has expired. Please sign in again.".to_string()
        }
        _ => "Your session is no longer valid. Please sign in again.".to_string(),
    }
}

fn enrich_message(status: u16, server_message: Option<&str>) -> String {
    match status {
        403 => "You do not have permission to perform this action".to_string(),
        404 => "The requested resource was not found".to_string(),
        422 => server_message
            .map(str::to_string)
            .unwrap_or_else(|| "The submitted data is invalid".to_string()),
        s if s >= 500 => {
            "Something went wrong on the server. Please try again later.".to_string()
        }
        _ => server_message
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}: {}", status_reason(status))),
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_401_as_auth_with_server_message() {
        let err = classify_status(401, r#"{"message":"Token expired"}"#);
        match err {
            ApiError::Auth { message, status, body } => {
                assert_eq!(message, "Token expired");
                assert_eq!(status, 401);
                assert!(body.is_some());
            }
            other => panic!("expected Auth error, got {other:?}"),
        }
    }

    #[test]
    fn classifies_401_without_body() {
        let err = classify_status(401, "");
        assert_eq!(err.status(), 401);
        assert_eq!(err.message(), "HTTP 401: Unauthorized");
        assert_eq!(err.body(), None);
    }

    #[test]
    fn enriches_403_and_404() {
        let forbidden = classify_status(403, "");
        assert_eq!(
            forbidden.message(),
            "You do not have permission to perform this action"
        );

        let missing = classify_status(404, r#"{"message":"no such run"}"#);
        assert_eq!(missing.message(), "The requested resource was not found");
        assert_eq!(missing.body(), Some(r#"{"message":"no such run"}"#));
    }

    #[test]
    fn enriches_422_preferring_server_message() {
        let with_detail = classify_status(422, r#"{"message":"distance must be positive"}"#);
        assert_eq!(with_detail.message(), "distance must be positive");

        let without_detail = classify_status(422, "not json at all");
        assert_eq!(without_detail.message(), "The submitted data is invalid");
    }

    #[test]
    fn enriches_server_errors_generically() {
        for status in [500, 502, 503, 504] {
            let err = classify_status(status, r#"{"message":"stack trace here"}"#);
            assert_eq!(
                err.message(),
                "Something went wrong on the server. Please try again later."
            );
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn falls_back_to_status_line_for_unparseable_body() {
        let err = classify_status(409, "<html>conflict</html>");
        assert_eq!(err.message(), "HTTP 409: Conflict");
        assert_eq!(err.body(), Some("<html>conflict</html>"));
    }

    #[test]
    fn extracts_message_then_error_field() {
        assert_eq!(
            extract_server_message(r#"{"message":"first","error":"second"}"#),
            Some("first".to_string())
        );
        assert_eq!(
            extract_server_message(r#"{"error":"second"}"#),
            Some("second".to_string())
        );
        assert_eq!(extract_server_message(r#"{"code":42}"#), None);
        assert_eq!(extract_server_message("plain text"), None);
    }

    #[test]
    fn auth_failure_message_distinguishes_expired() {
        assert_eq!(
            auth_failure_message(Some("Access token has expired")),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(
            auth_failure_message(Some("invalid signature")),
            "Your session is no longer valid. Please sign in again."
        );
        assert_eq!(
            auth_failure_message(None),
            "Your session is no longer valid. Please sign in again."
        );
    }
}
