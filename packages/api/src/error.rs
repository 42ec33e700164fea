//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "message": "User not found" }
/// ```
///
/// | Status | Meaning |
/// |--------|---------|
/// | 400 | invalid body, invalid path id, or an attempt to change an immutable field |
/// | 404 | the addressed or referenced entity does not exist |
/// | 500 | anything else; the message is always `"Internal server error"` |
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fixed messages shared by the server and its tests.
pub mod messages {
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const POST_NOT_FOUND: &str = "Post not found";
    pub const ROUTE_NOT_FOUND: &str = "Route not found";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_as_message_object() {
        let e = ErrorResponse::new(messages::USER_NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            serde_json::json!({ "message": "User not found" })
        );
    }
}
