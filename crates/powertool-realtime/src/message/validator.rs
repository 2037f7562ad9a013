//! Frame, token, and payload validation rules.

use powertool_core::error::AppError;
use powertool_core::types::id::Token;

use super::types::Payload;

/// Maximum allowed token length in bytes.
const MAX_TOKEN_LEN: usize = 256;

/// Validates a raw inbound frame before decoding.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {} bytes",
            max_bytes
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty frame"));
    }

    Ok(())
}

/// Validates a correlation token.
pub fn validate_token(token: &Token) -> Result<(), AppError> {
    if token.as_str().is_empty() || token.as_str().len() > MAX_TOKEN_LEN {
        return Err(AppError::validation("Invalid token length"));
    }

    if token.as_str().chars().any(char::is_control) {
        return Err(AppError::validation("Token contains control characters"));
    }

    Ok(())
}

/// Returns the encoded size of a payload, or an error if it exceeds `max_bytes`.
pub fn validate_payload_size(payload: &Payload, max_bytes: usize) -> Result<usize, AppError> {
    let size = serde_json::to_vec(payload)?.len();
    if size > max_bytes {
        return Err(AppError::validation(format!(
            "Payload of {} bytes exceeds maximum of {} bytes",
            size, max_bytes
        )));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_rules() {
        assert!(validate_token(&Token::from("incoming-token")).is_ok());
        assert!(validate_token(&Token::from("")).is_err());
        assert!(validate_token(&Token::from("a\nb")).is_err());
        assert!(validate_token(&Token::new("t".repeat(MAX_TOKEN_LEN + 1))).is_err());
    }

    #[test]
    fn test_payload_size() {
        assert_eq!(validate_payload_size(&json!("hi"), 16).expect("fits"), 4);
        assert!(validate_payload_size(&json!("x".repeat(32)), 16).is_err());
    }
}
