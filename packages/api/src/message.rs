//! Confirmation body for successful deletes.

use serde::{Deserialize, Serialize};

/// `{ "message": "User deleted successfully!" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn user_deleted() -> Self {
        Self::new("User deleted successfully!")
    }

    pub fn post_deleted() -> Self {
        Self::new("Post deleted successfully!")
    }
}
