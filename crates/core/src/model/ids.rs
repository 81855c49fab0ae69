use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be empty", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Backend identifiers are opaque document ids, so every id wraps a non-empty string.
macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self::new(trimmed))
            }
        }
    };
}

backend_id!(
    /// Identifier of a course in the catalog.
    CourseId
);
backend_id!(
    /// Identifier of one student's enrollment record.
    EnrollmentId
);
backend_id!(
    /// Identifier of an authenticated user.
    UserId
);
backend_id!(
    /// Identifier of a course batch (cohort).
    BatchId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_display_is_raw_value() {
        let id = CourseId::new("65a1f0");
        assert_eq!(id.to_string(), "65a1f0");
        assert_eq!(format!("{id:?}"), "CourseId(65a1f0)");
    }

    #[test]
    fn from_str_trims_and_rejects_empty() {
        let id: UserId = "  u-1 ".parse().unwrap();
        assert_eq!(id.as_str(), "u-1");

        let err = "   ".parse::<BatchId>().unwrap_err();
        assert_eq!(err.to_string(), "BatchId cannot be empty");
    }

    #[test]
    fn ids_order_by_value() {
        let mut ids = vec![EnrollmentId::new("b"), EnrollmentId::new("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
