use std::fmt;
use std::str::FromStr;

use crate::model::ids::UserId;

/// Role string attached to a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    /// Anything other than `admin` (case-insensitive) is a student.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else {
            Ok(Role::Student)
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Student => "student",
            Role::Admin => "admin",
        })
    }
}

/// The signed-in user, injected into services instead of read from global state.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: UserId,
    role: Role,
    access_token: String,
}

impl SessionContext {
    #[must_use]
    pub fn new(user_id: UserId, role: Role, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            access_token: access_token.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Keep the bearer token out of logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_defaults_to_student() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("instructor".parse::<Role>().unwrap(), Role::Student);
    }

    #[test]
    fn debug_redacts_token() {
        let session = SessionContext::new(UserId::new("u1"), Role::Admin, "secret-token");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(session.is_admin());
    }
}
