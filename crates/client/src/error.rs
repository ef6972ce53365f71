//! Client-boundary error model and the inline banner it renders to.

use auditdesk_auth::{AuthError, AuthzError};
use auditdesk_core::{DomainError, UserId};
use auditdesk_infra::{ConfigError, DataAccessError, StorageError};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a client operation can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The identity exists but its profile row could not be written and the
    /// identity could not be removed either. The draft sits in the outbox.
    #[error("account {identity_id} was created without a profile; the profile will be retried")]
    ConsistencyGap { identity_id: UserId },
}

impl AppError {
    /// Text shown to the user; store errors show only the store's message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DataAccess(DataAccessError::Api { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn banner(&self) -> ErrorBanner {
        ErrorBanner::new(self.user_message())
    }
}

/// Inline, dismissible error message owned by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    message: String,
    dismissed: bool,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            dismissed: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible(&self) -> bool {
        !self.dismissed
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

impl From<&AppError> for ErrorBanner {
    fn from(err: &AppError) -> Self {
        err.banner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_show_the_store_message() {
        let err = AppError::from(DataAccessError::api(409, "duplicate key value"));
        assert_eq!(err.banner().message(), "duplicate key value");
    }

    #[test]
    fn auth_errors_are_displayable() {
        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.user_message(), "invalid email or password");
    }

    #[test]
    fn dismissing_hides_the_banner() {
        let mut banner = ErrorBanner::new("boom");
        assert!(banner.is_visible());
        banner.dismiss();
        assert!(!banner.is_visible());
        assert_eq!(banner.message(), "boom");
    }
}
