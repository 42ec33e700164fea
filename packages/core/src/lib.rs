//! Entity model and request validation for the Postboard API.
//!
//! This crate is pure: no I/O, no HTTP. The server crate builds its handlers
//! on top of it, and clients may use the same types to build requests.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Entities [`User`] and [`Post`], and the validated payloads that create or change them |
//! | [`validation`] | Rule-table schemas and the `validate_*` entry points |
//!
//! # Quick start
//!
//! ```rust
//! use postboard::{validate_user, ValidationError};
//! use serde_json::json;
//!
//! let user = validate_user(&json!({
//!     "firstName": "Ada",
//!     "lastName": "Lovelace",
//!     "email": "ada@example.com",
//!     "role": "ignored"
//! }))
//! .unwrap();
//! assert_eq!(user.first_name, "Ada");
//!
//! let err = validate_user(&json!({ "firstName": "Ada" })).unwrap_err();
//! assert_eq!(err, ValidationError::Required("lastName"));
//! ```

pub mod types;
pub mod validation;

pub use types::{NewPost, NewUser, Post, PostChanges, PostDraft, User, UserChanges};
pub use validation::{
    validate_post, validate_post_changes, validate_user, validate_user_changes, FieldKind,
    FieldRule, Format, Mode, Schema, ValidationError, POST_SCHEMA, USER_SCHEMA,
};
