use thiserror::Error;

/// Authentication failure. Recoverable; the message is shown inline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("no account exists for this email")]
    UnknownAccount,

    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    InvalidRegistration(String),

    #[error("session has expired, please sign in again")]
    SessionExpired,

    #[error("not signed in")]
    NotSignedIn,

    #[error("privileged identity operations need a service key")]
    PrivilegedKeyMissing,

    #[error("identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::InvalidRegistration(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}
