//! `auditdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives: identifiers, the relational
//! schema of the remote store, typed records and their status enums. No IO.

pub mod activity;
pub mod audit;
pub mod checklist;
pub mod client;
pub mod document;
pub mod entity;
pub mod error;
pub mod id;
pub mod schema;
pub mod task;
pub mod template;
pub mod value_object;

pub use activity::ActivityLog;
pub use audit::{Audit, AuditStatus, AuditStatusPatch, AuditWithDetails, NewAudit};
pub use checklist::{
    Checklist, ChecklistItem, ChecklistItemPatch, ChecklistProgress, ChecklistWithItems,
    NewChecklist, NewChecklistItem,
};
pub use client::{Client, ClientForm, ClientPatch, NewClient};
pub use document::{Document, Folder, FolderType, FolderWithClient, NewFolder};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    ActivityLogId, AuditId, ChecklistId, ChecklistItemId, ClientId, DocumentId, FolderId,
    FormTemplateId, TaskId, UserId,
};
pub use schema::{Cardinality, Relation, Table};
pub use task::{NewTask, Task, TaskForm, TaskStatus, TaskStatusPatch, TaskWithClient};
pub use template::{FormTemplate, NewFormTemplate, TemplatePatch};
pub use value_object::{EmailAddress, blank_to_none};
