use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{ClientId, DocumentId, FolderId, UserId};
use crate::schema::Table;

/// Fixed folder categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderType {
    MeetingNotes,
    WorkingPapers,
    Contracts,
    Evidence,
}

impl FolderType {
    pub const ALL: [FolderType; 4] = [
        FolderType::MeetingNotes,
        FolderType::WorkingPapers,
        FolderType::Contracts,
        FolderType::Evidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::MeetingNotes => "meeting_notes",
            FolderType::WorkingPapers => "working_papers",
            FolderType::Contracts => "contracts",
            FolderType::Evidence => "evidence",
        }
    }
}

impl core::fmt::Display for FolderType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for FolderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FolderType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown folder type '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub client_id: Option<ClientId>,
    pub name: String,
    pub folder_type: FolderType,
    pub parent_id: Option<FolderId>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Folder {
    type Id = FolderId;
    const TABLE: Table = Table::Folders;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderWithClient {
    #[serde(flatten)]
    pub folder: Folder,
    #[serde(default)]
    pub clients: Option<Client>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFolder {
    pub client_id: Option<ClientId>,
    pub name: String,
    pub folder_type: FolderType,
    pub parent_id: Option<FolderId>,
    pub created_by: Option<UserId>,
}

impl NewFolder {
    pub fn new(
        client_id: Option<ClientId>,
        name: impl Into<String>,
        folder_type: FolderType,
        parent_id: Option<FolderId>,
        created_by: Option<UserId>,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("folder name is required"));
        }
        Ok(Self {
            client_id,
            name,
            folder_type,
            parent_id,
            created_by,
        })
    }
}

/// Metadata of an uploaded file. The upload pipeline itself is not provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub folder_id: Option<FolderId>,
    pub client_id: Option<ClientId>,
    pub name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Document {
    type Id = DocumentId;
    const TABLE: Table = Table::Documents;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_types_parse_from_wire_names() {
        for t in FolderType::ALL {
            assert_eq!(t.as_str().parse::<FolderType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
    }

    #[test]
    fn folder_name_is_required() {
        assert!(NewFolder::new(None, "  ", FolderType::Evidence, None, None).is_err());
    }
}
