//! Schema-declarative request validation.
//!
//! Each accepted request body is described by a [`Schema`]: a table of
//! [`FieldRule`]s evaluated uniformly, in declaration order, by one
//! interpreter. The first violation wins. Validation never mutates its input;
//! it returns a normalized value holding only the declared fields, which is
//! then deserialised into the typed payload ([`NewUser`], [`PostDraft`], ...).
//!
//! | Schema | Fields |
//! |--------|--------|
//! | [`USER_SCHEMA`] | `firstName` string, `lastName` string, `email` string/email (immutable) |
//! | [`POST_SCHEMA`] | `title` string, `description` string, `userId` optional nullable integer |

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{NewUser, PostChanges, PostDraft, UserChanges};

/// Errors returned when a request body does not satisfy its schema.
///
/// Messages are part of the HTTP contract: they are returned verbatim in the
/// `message` field of a 400 response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"value\" must be of type object")]
    NotAnObject,

    #[error("\"{0}\" is required")]
    Required(&'static str),

    #[error("\"{0}\" must be a string")]
    NotAString(&'static str),

    #[error("\"{0}\" is not allowed to be empty")]
    Empty(&'static str),

    #[error("\"{0}\" must be a valid email")]
    InvalidEmail(&'static str),

    #[error("\"{0}\" must be a number")]
    NotANumber(&'static str),

    #[error("\"{0}\" must be an integer")]
    NotAnInteger(&'static str),

    #[error("{} field cannot be modified", capitalize(.0))]
    Immutable(&'static str),

    #[error("malformed body: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// The JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A non-empty JSON string.
    String,
    /// A JSON number with no fractional part that fits in `i64`.
    Integer,
}

/// An extra predicate applied to a string field after the type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
}

impl Format {
    fn check(self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        match self {
            Format::Email if EMAIL_RE.is_match(value) => Ok(()),
            Format::Email => Err(ValidationError::InvalidEmail(field)),
        }
    }
}

/// Whether a body creates an entity (required fields enforced) or changes an
/// existing one (every field optional, immutable fields forbidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// One row of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present when creating.
    pub required: bool,
    /// Accepts an explicit JSON `null`.
    pub nullable: bool,
    /// May appear in an update body.
    pub mutable: bool,
    pub format: Option<Format>,
}

impl FieldRule {
    /// A required, non-nullable, mutable string field.
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: true,
            nullable: false,
            mutable: true,
            format: None,
        }
    }

    /// A required, non-nullable, mutable integer field.
    pub const fn integer(name: &'static str) -> Self {
        Self {
            kind: FieldKind::Integer,
            ..Self::string(name)
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn immutable(self) -> Self {
        Self {
            mutable: false,
            ..self
        }
    }

    pub const fn with_format(self, format: Format) -> Self {
        Self {
            format: Some(format),
            ..self
        }
    }

    /// Check a present value and return its normalized form.
    fn check(&self, value: &Value) -> Result<Value, ValidationError> {
        if value.is_null() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(self.type_mismatch())
            };
        }

        match self.kind {
            FieldKind::String => {
                let s = value.as_str().ok_or_else(|| self.type_mismatch())?;
                if s.is_empty() {
                    return Err(ValidationError::Empty(self.name));
                }
                if let Some(format) = self.format {
                    format.check(self.name, s)?;
                }
                Ok(Value::String(s.to_owned()))
            }
            FieldKind::Integer => as_integer(self.name, value).map(Value::from),
        }
    }

    fn type_mismatch(&self) -> ValidationError {
        match self.kind {
            FieldKind::String => ValidationError::NotAString(self.name),
            FieldKind::Integer => ValidationError::NotANumber(self.name),
        }
    }
}

/// An ordered set of [`FieldRule`]s describing one accepted body shape.
#[derive(Debug)]
pub struct Schema {
    pub rules: &'static [FieldRule],
}

impl Schema {
    /// Validate `input` and return an object holding only the declared
    /// fields. Unknown fields are dropped.
    pub fn validate(&self, input: &Value, mode: Mode) -> Result<Map<String, Value>, ValidationError> {
        let object = input.as_object().ok_or(ValidationError::NotAnObject)?;

        // An immutable field in an update body is rejected before anything
        // else is looked at.
        if mode == Mode::Update {
            if let Some(rule) = self
                .rules
                .iter()
                .find(|r| !r.mutable && object.contains_key(r.name))
            {
                return Err(ValidationError::Immutable(rule.name));
            }
        }

        let mut normalized = Map::new();
        for rule in self.rules {
            match object.get(rule.name) {
                Some(value) => {
                    normalized.insert(rule.name.to_owned(), rule.check(value)?);
                }
                None if rule.required && mode == Mode::Create => {
                    return Err(ValidationError::Required(rule.name));
                }
                None => {}
            }
        }
        Ok(normalized)
    }

    /// Validate `input` and deserialise the normalized value into `T`.
    pub fn parse<T: DeserializeOwned>(&self, input: &Value, mode: Mode) -> Result<T, ValidationError> {
        let normalized = self.validate(input, mode)?;
        serde_json::from_value(Value::Object(normalized))
            .map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

pub static USER_SCHEMA: Schema = Schema {
    rules: &[
        FieldRule::string("firstName"),
        FieldRule::string("lastName"),
        FieldRule::string("email")
            .with_format(Format::Email)
            .immutable(),
    ],
};

pub static POST_SCHEMA: Schema = Schema {
    rules: &[
        FieldRule::string("title"),
        FieldRule::string("description"),
        FieldRule::integer("userId").optional().nullable(),
    ],
};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate a create-user body.
pub fn validate_user(input: &Value) -> Result<NewUser, ValidationError> {
    USER_SCHEMA.parse(input, Mode::Create)
}

/// Validate an update-user body. Any body carrying `email` is rejected.
pub fn validate_user_changes(input: &Value) -> Result<UserChanges, ValidationError> {
    USER_SCHEMA.parse(input, Mode::Update)
}

/// Validate a create-post body. `userId` may be absent or `null` here.
pub fn validate_post(input: &Value) -> Result<PostDraft, ValidationError> {
    POST_SCHEMA.parse(input, Mode::Create)
}

/// Validate an update-post body.
pub fn validate_post_changes(input: &Value) -> Result<PostChanges, ValidationError> {
    POST_SCHEMA.parse(input, Mode::Update)
}

// --- helpers -----------------------------------------------------------------

/// Numbers, and strings holding a number (`"1"`, `" 2.0 "`), are accepted
/// as long as the value is integral.
fn as_integer(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    let f = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Ok(i),
            None => n.as_f64().ok_or(ValidationError::NotANumber(field))?,
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or(ValidationError::NotANumber(field))?
        }
        _ => return Err(ValidationError::NotANumber(field)),
    };
    // 2.0 is an integer; 2.5 and anything beyond i64 are not.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(ValidationError::NotAnInteger(field))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Local part, `@`, one or more dotted labels, alphabetic TLD of 2+ chars.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("invalid email regex")
});

// --- tests -------------------------------------------------------------------
