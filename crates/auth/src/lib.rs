//! `auditdesk-auth`: authentication state and role authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! sessions, profiles, the auth state machine and the role gate as pure data.

pub mod authorize;
pub mod credentials;
pub mod error;
pub mod permissions;
pub mod profile;
pub mod roles;
pub mod session;
pub mod state;

pub use authorize::{AuthorizationExplanation, AuthzError, authorize, explain, visible_actions, visible_for};
pub use credentials::{Credentials, MIN_PASSWORD_LEN, RegistrationForm, SignUpRequest};
pub use error::AuthError;
pub use permissions::{ADMIN_ONLY, Action};
pub use profile::{NewProfile, Profile, ProfileNamePatch, ProfileRolePatch};
pub use roles::Role;
pub use session::{Identity, Session, SessionValidationError, validate_session};
pub use state::{AuthPhase, AuthState, RootView, SessionChange};
