use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// A single schema violation inside an upstream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// An upstream payload failed schema validation. Carries every offending
/// field, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn single(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                problem: problem.into(),
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid payload: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// What went wrong while talking to the GitHub API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub responded with {status}: {message}")]
    Http { status: StatusCode, message: String },

    /// The response body did not match the expected schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = ValidationError::new(vec![
            FieldIssue {
                field: "avatar_url".into(),
                problem: "not a well-formed URL".into(),
            },
            FieldIssue {
                field: "followers".into(),
                problem: "expected a non-negative integer".into(),
            },
        ]);
        let rendered = err.to_string();
        assert!(rendered.contains("avatar_url: not a well-formed URL"));
        assert!(rendered.contains("followers: expected a non-negative integer"));
    }

    #[test]
    fn http_error_carries_upstream_status() {
        let err = FetchError::Http {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".into(),
        };
        assert_eq!(
            err.to_string(),
            "GitHub responded with 404 Not Found: Not Found"
        );
    }
}
