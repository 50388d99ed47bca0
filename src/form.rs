//! Search form state machine. Owns the committed username and the
//! repo-list visibility flag; the UI only mirrors what lives here.

use thiserror::Error;

/// Upper bound on a submitted username, counted in characters.
pub const MAX_USERNAME_LEN: usize = 50;

/// Why a submitted username was rejected before any fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("enter at least one character")]
    Empty,
    #[error("username must be at most {} characters", MAX_USERNAME_LEN)]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Nothing submitted yet; the placeholder prompt is shown.
    Untouched,
    /// The last submission failed local validation.
    Invalid,
    /// A username is committed and drives the profile view.
    Submitted,
}

pub struct SearchForm {
    phase: FormPhase,
    last_error: Option<InputError>,
    committed: Option<String>,
    show_repos: bool,
}

impl SearchForm {
    pub fn new() -> Self {
        Self {
            phase: FormPhase::Untouched,
            last_error: None,
            committed: None,
            show_repos: false,
        }
    }

    /// Validates and commits a username. A successful commit collapses the
    /// repo list, so at most one profile's list is ever open. A rejected
    /// submission leaves the previously committed username untouched.
    pub fn submit(&mut self, raw: &str) -> Result<String, InputError> {
        let trimmed = raw.trim();
        let checked = if trimmed.is_empty() {
            Err(InputError::Empty)
        } else if trimmed.chars().count() > MAX_USERNAME_LEN {
            Err(InputError::TooLong)
        } else {
            Ok(trimmed.to_owned())
        };

        match checked {
            Ok(username) => {
                self.committed = Some(username.clone());
                self.show_repos = false;
                self.phase = FormPhase::Submitted;
                self.last_error = None;
                Ok(username)
            }
            Err(reason) => {
                self.phase = FormPhase::Invalid;
                self.last_error = Some(reason.clone());
                Err(reason)
            }
        }
    }

    /// Flips repo-list visibility. A no-op until a username is committed.
    pub fn toggle_repos(&mut self) -> bool {
        if self.phase == FormPhase::Submitted {
            self.show_repos = !self.show_repos;
        }
        self.show_repos
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&InputError> {
        self.last_error.as_ref()
    }

    pub fn committed(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    pub fn repos_visible(&self) -> bool {
        self.show_repos
    }
}

impl Default for SearchForm {
    fn default() -> Self {
        Self::new()
    }
}
