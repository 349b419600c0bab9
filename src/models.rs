use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const AUTH_ACCESS: &str = "auth";

/// Identifier of a stored document.
///
/// Only strings that parse as a UUID are well-formed; anything else is
/// treated as a lookup miss before the database is touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw)
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub completed_at: Option<i64>,
}

/// Completion state of a todo. `completed_at` is set exactly when the
/// todo is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub completed: bool,
    pub completed_at: Option<i64>,
}

impl Completion {
    pub fn pending() -> Self {
        Self {
            completed: false,
            completed_at: None,
        }
    }

    /// `Some(true)` completes at `now_millis`; `Some(false)` and absence
    /// both reset the todo to pending.
    pub fn from_request(completed: Option<bool>, now_millis: i64) -> Self {
        match completed {
            Some(true) => Self {
                completed: true,
                completed_at: Some(now_millis),
            },
            _ => Self::pending(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuthToken {
    pub access: String,
    pub token: String,
}

impl AuthToken {
    pub fn auth(token: String) -> Self {
        Self {
            access: AUTH_ACCESS.to_string(),
            token,
        }
    }
}

/// Tokens owned by a user, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList(Vec<AuthToken>);

impl TokenList {
    pub fn push(&mut self, token: AuthToken) {
        self.0.push(token);
    }

    /// Removes every entry carrying `token`, returning whether any did.
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t.token != token);
        self.0.len() != before
    }

    pub fn contains(&self, token: &str, access: &str) -> bool {
        self.0.iter().any(|t| t.token == token && t.access == access)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthToken> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<AuthToken>> for TokenList {
    fn from(tokens: Vec<AuthToken>) -> Self {
        Self(tokens)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    #[sqlx(skip)]
    pub tokens: TokenList,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTodoRequest {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTodoRequest {
    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl CreateUserRequest {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}
