//! `auditdesk-client`
//!
//! Client core of the audit desk: the session manager that owns the current
//! user, the navigation gate, and one service per page issuing that page's
//! reads and writes against the remote store. Rendering lives elsewhere.

pub mod app;
pub mod confirm;
pub mod error;
pub mod navigation;
pub mod outbox;
pub mod scope;
pub mod services;
pub mod session;

mod provision;

pub use app::App;
pub use confirm::DeletePrompt;
pub use error::{AppError, AppResult, ErrorBanner};
pub use navigation::{MENU, MenuItem, Page, menu, menu_for_role, role_badge};
pub use outbox::{PendingProfile, ProfileOutbox};
pub use scope::ViewScope;
pub use services::Services;
pub use session::SessionManager;
