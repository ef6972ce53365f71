//! Relational schema of the remote store: named tables and the foreign keys
//! that declarative joins follow.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A named relation in the remote store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Clients,
    FormTemplates,
    Tasks,
    Audits,
    Folders,
    Documents,
    Checklists,
    ChecklistItems,
    ActivityLog,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Profiles,
        Table::Clients,
        Table::FormTemplates,
        Table::Tasks,
        Table::Audits,
        Table::Folders,
        Table::Documents,
        Table::Checklists,
        Table::ChecklistItems,
        Table::ActivityLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Clients => "clients",
            Table::FormTemplates => "form_templates",
            Table::Tasks => "tasks",
            Table::Audits => "audits",
            Table::Folders => "folders",
            Table::Documents => "documents",
            Table::Checklists => "checklists",
            Table::ChecklistItems => "checklist_items",
            Table::ActivityLog => "activity_log",
        }
    }

    /// Relation followed when `self` embeds `to`, if the schema declares one.
    pub fn relation_to(&self, to: Table) -> Option<&'static Relation> {
        RELATIONS.iter().find(|r| r.from == *self && r.to == to)
    }

    /// All relations that can be embedded from this table.
    pub fn relations(&self) -> impl Iterator<Item = &'static Relation> + '_ {
        RELATIONS.iter().filter(move |r| r.from == *self)
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown table '{s}'")))
    }
}

/// Shape of an embedded relation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cardinality {
    /// `from.column` references `to.id`; embeds as an object or null.
    ToOne,
    /// `to.column` references `from.id`; embeds as an array (possibly empty).
    ToMany,
}

/// A foreign key usable for a declarative join.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Relation {
    pub from: Table,
    pub to: Table,
    pub column: &'static str,
    pub cardinality: Cardinality,
}

const fn to_one(from: Table, column: &'static str, to: Table) -> Relation {
    Relation {
        from,
        to,
        column,
        cardinality: Cardinality::ToOne,
    }
}

const fn to_many(from: Table, to: Table, column: &'static str) -> Relation {
    Relation {
        from,
        to,
        column,
        cardinality: Cardinality::ToMany,
    }
}

const RELATIONS: &[Relation] = &[
    to_one(Table::Tasks, "client_id", Table::Clients),
    to_one(Table::Audits, "client_id", Table::Clients),
    to_one(Table::Audits, "task_id", Table::Tasks),
    to_one(Table::Audits, "form_template_id", Table::FormTemplates),
    to_one(Table::Folders, "client_id", Table::Clients),
    to_one(Table::Folders, "parent_id", Table::Folders),
    to_one(Table::Documents, "folder_id", Table::Folders),
    to_one(Table::Documents, "client_id", Table::Clients),
    to_one(Table::Checklists, "client_id", Table::Clients),
    to_many(Table::Checklists, Table::ChecklistItems, "checklist_id"),
    to_one(Table::ActivityLog, "user_id", Table::Profiles),
];
