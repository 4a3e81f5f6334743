use crate::core::error::{LedgerError, LedgerResult};
use std::fmt::Display;

/// Identifier of an authenticated user. Never empty and never contains a
/// NUL byte, which the disk store uses as its key separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> LedgerResult<Self> {
        let id = id.trim();
        if id.is_empty() || id.contains('\0') {
            return Err(LedgerError::Authentication);
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity an operation runs under.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user_id: &str) -> LedgerResult<Self> {
        Ok(Self {
            user: Some(UserId::new(user_id)?),
        })
    }

    /// Builds a session from an optional configured identity; a missing or
    /// blank id yields an anonymous session.
    pub fn from_optional(user_id: Option<&str>) -> Self {
        Self {
            user: user_id.and_then(|id| UserId::new(id).ok()),
        }
    }

    pub fn user(&self) -> LedgerResult<&UserId> {
        self.user.as_ref().ok_or(LedgerError::Authentication)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
