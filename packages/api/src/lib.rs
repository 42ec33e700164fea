//! Request and response types for the Postboard HTTP API.
//!
//! Entity bodies are the [`postboard::User`] and [`postboard::Post`] types
//! themselves; this crate adds the bodies that are not entities.
//!
//! # Endpoints covered
//!
//! | Method | Path | Body | Success |
//! |--------|------|------|---------|
//! | POST | `/users` | `{firstName, lastName, email}` | 201 [`User`] |
//! | GET | `/users` | | 200 `[User]` |
//! | GET | `/users/{id}` | | 200 [`User`] |
//! | PUT | `/users/{id}` | subset of `{firstName, lastName}` | 200 [`User`] |
//! | DELETE | `/users/{id}` | | 200 [`MessageResponse`] |
//! | POST | `/posts` | `{title, description, userId}` | 201 [`Post`] |
//! | GET | `/posts` | | 200 `[Post]` |
//! | GET | `/posts/{id}` | | 200 [`Post`] |
//! | GET | `/posts/user/{userId}` | | 200 `[Post]` |
//! | PUT | `/posts/{id}` | subset of `{title, description, userId}` | 200 [`Post`] |
//! | DELETE | `/posts/{id}` | | 200 [`MessageResponse`] |
//!
//! Every failure carries an [`ErrorResponse`].

pub mod error;
pub mod message;

pub use error::ErrorResponse;
pub use message::MessageResponse;
pub use postboard::{Post, User};
