//! Entity model: [`User`], [`Post`], and the validated payloads that create
//! or change them.
//!
//! Entities serialise with camelCase field names (`firstName`, `userId`),
//! which is the JSON shape of every request and response body.

use serde::{Deserialize, Serialize};

/// A registered user. Owns zero or more [`Post`]s; deleting a user deletes
/// its posts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-generated identifier. Never reused.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Fixed at creation; update requests that carry it are rejected.
    pub email: String,
}

impl User {
    /// Overwrite only the fields present in `changes`.
    pub fn merge(&mut self, changes: UserChanges) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
    }
}

/// A post owned by exactly one [`User`].
///
/// `user` carries the owning user when the post was read through the store;
/// every HTTP response embeds it.
///
/// ```json
/// {
///   "id": 1,
///   "title": "T",
///   "description": "D",
///   "userId": 1,
///   "user": { "id": 1, "firstName": "A", "lastName": "B", "email": "a@b.com" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Store-generated identifier. Never reused.
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Identifier of the owning user.
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Post {
    /// Overwrite only the fields present in `changes`.
    ///
    /// Reassigning `user_id` drops the embedded `user`, which no longer
    /// describes the owner; the store fills it in again on save.
    pub fn merge(&mut self, changes: PostChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(user_id) = changes.user_id {
            if user_id != self.user_id {
                self.user_id = user_id;
                self.user = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validated payloads
// ---------------------------------------------------------------------------

/// Validated body of a create-user request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Validated body of an update-user request. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Validated body of a create-post request.
///
/// `user_id` is optional at the schema level; the create handler insists on
/// it before touching the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Validated body of an update-post request. `None` keeps the stored value;
/// an explicit `"userId": null` is treated the same as an absent one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// A post ready to be inserted: the owner has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
        }
    }

    fn post() -> Post {
        Post {
            id: 7,
            title: "Notes".into(),
            description: "On the analytical engine".into(),
            user_id: 1,
            user: Some(user()),
        }
    }

    #[test]
    fn user_serialises_camel_case() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            })
        );
    }

    #[test]
    fn post_embeds_user_and_omits_it_when_absent() {
        let json = serde_json::to_value(post()).unwrap();
        assert_eq!(json["userId"], 1);
        assert_eq!(json["user"]["firstName"], "Ada");

        let mut bare = post();
        bare.user = None;
        let json = serde_json::to_value(bare).unwrap();
        assert!(json.get("user").is_none());
    }

    #[test]
    fn user_merge_keeps_absent_fields() {
        let mut u = user();
        u.merge(UserChanges {
            first_name: None,
            last_name: Some("Byron".into()),
        });
        assert_eq!(u.first_name, "Ada");
        assert_eq!(u.last_name, "Byron");
        assert_eq!(u.email, "ada@example.com");
    }

    #[test]
    fn post_merge_reassigning_owner_drops_embedded_user() {
        let mut p = post();
        p.merge(PostChanges {
            user_id: Some(2),
            ..Default::default()
        });
        assert_eq!(p.user_id, 2);
        assert!(p.user.is_none());
        assert_eq!(p.title, "Notes");
    }

    #[test]
    fn post_merge_same_owner_keeps_embedded_user() {
        let mut p = post();
        p.merge(PostChanges {
            title: Some("Sketches".into()),
            user_id: Some(1),
            ..Default::default()
        });
        assert_eq!(p.title, "Sketches");
        assert!(p.user.is_some());
    }
}
