use std::env;

use course_core::model::{Role, SessionContext, UserId};

use crate::error::AppServicesError;

pub const ACCESS_TOKEN_VAR: &str = "COURSEWORK_ACCESS_TOKEN";
pub const USER_ID_VAR: &str = "COURSEWORK_USER_ID";
pub const ROLE_VAR: &str = "COURSEWORK_ROLE";

/// Sign-in details read once at startup and injected as a `SessionContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub user_id: UserId,
    pub role: Role,
    pub access_token: String,
}

impl SessionConfig {
    /// Read the session from `COURSEWORK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::MissingSession` naming the first required
    /// variable that is unset or blank.
    pub fn from_env() -> Result<Self, AppServicesError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::MissingSession` if a required value is missing.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppServicesError> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let access_token =
            value(ACCESS_TOKEN_VAR).ok_or(AppServicesError::MissingSession(ACCESS_TOKEN_VAR))?;
        let user_id = value(USER_ID_VAR)
            .map(UserId::new)
            .ok_or(AppServicesError::MissingSession(USER_ID_VAR))?;
        let role = value(ROLE_VAR)
            .map(|r| r.parse().unwrap_or_default())
            .unwrap_or_default();
        Ok(Self {
            user_id,
            role,
            access_token,
        })
    }

    #[must_use]
    pub fn into_session(self) -> SessionContext {
        SessionContext::new(self.user_id, self.role, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_session_with_default_role() {
        let config = SessionConfig::from_lookup(lookup(&[
            (ACCESS_TOKEN_VAR, "tok"),
            (USER_ID_VAR, " 42 "),
        ]))
        .unwrap();
        assert_eq!(config.user_id.as_str(), "42");
        assert_eq!(config.role, Role::Student);

        let session = config.into_session();
        assert_eq!(session.access_token(), "tok");
        assert!(!session.is_admin());
    }

    #[test]
    fn admin_role_is_recognized() {
        let config = SessionConfig::from_lookup(lookup(&[
            (ACCESS_TOKEN_VAR, "tok"),
            (USER_ID_VAR, "root"),
            (ROLE_VAR, "Admin"),
        ]))
        .unwrap();
        assert_eq!(config.role, Role::Admin);
    }

    #[test]
    fn missing_token_is_reported() {
        let err = SessionConfig::from_lookup(lookup(&[(USER_ID_VAR, "42"), (ACCESS_TOKEN_VAR, " ")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppServicesError::MissingSession(ACCESS_TOKEN_VAR)
        ));
    }
}
