//! One service per page, each exposing that page's data contract.
//!
//! Admin-only operations check the gate before touching the store. The check
//! is a client-side guard; row-level policies on the store stay authoritative.

pub mod audits;
pub mod checklists;
pub mod clients;
pub mod dashboard;
pub mod documents;
pub mod profile;
pub mod tasks;
pub mod templates;
pub mod users;

use std::sync::Arc;

use auditdesk_infra::DataStore;

use crate::session::SessionManager;

pub use audits::{AuditFormOptions, AuditService};
pub use checklists::ChecklistService;
pub use clients::ClientService;
pub use dashboard::{DashboardService, DashboardStats, StatusTally};
pub use documents::DocumentService;
pub use profile::ProfileService;
pub use tasks::TaskService;
pub use templates::TemplateService;
pub use users::UserService;

#[derive(Clone)]
pub struct Services {
    pub clients: ClientService,
    pub users: UserService,
    pub profile: ProfileService,
    pub templates: TemplateService,
    pub tasks: TaskService,
    pub audits: AuditService,
    pub checklists: ChecklistService,
    pub documents: DocumentService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            clients: ClientService::new(store.clone(), session.clone()),
            users: UserService::new(store.clone(), session.clone()),
            profile: ProfileService::new(store.clone(), session.clone()),
            templates: TemplateService::new(store.clone(), session.clone()),
            tasks: TaskService::new(store.clone(), session.clone()),
            audits: AuditService::new(store.clone(), session.clone()),
            checklists: ChecklistService::new(store.clone(), session.clone()),
            documents: DocumentService::new(store.clone(), session.clone()),
            dashboard: DashboardService::new(store, session),
        }
    }
}
