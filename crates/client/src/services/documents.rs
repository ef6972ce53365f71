use std::sync::Arc;

use auditdesk_auth::Action;
use auditdesk_core::{Client, ClientId, Document, Folder, FolderId, FolderType, FolderWithClient, NewFolder, Table};
use auditdesk_infra::{DataStore, Direction, Repository};
use tracing::instrument;

use crate::error::AppResult;
use crate::session::SessionManager;

/// Folder browsing per client. File upload is not provided.
#[derive(Clone)]
pub struct DocumentService {
    clients: Repository<Client>,
    folders: Repository<Folder>,
    documents: Repository<Document>,
    session: Arc<SessionManager>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            clients: Repository::new(store.clone()),
            folders: Repository::new(store.clone()),
            documents: Repository::new(store),
            session,
        }
    }

    /// Client picker, ordered by name.
    pub async fn clients(&self) -> AppResult<Vec<Client>> {
        self.session.require(Action::Documents)?;
        Ok(self.clients.list(self.clients.query().order_by("name", Direction::Asc)).await?)
    }

    /// Top-level folders of a client, joined with the client.
    pub async fn root_folders(&self, client_id: ClientId) -> AppResult<Vec<FolderWithClient>> {
        self.session.require(Action::Documents)?;
        let query = self
            .folders
            .query()
            .embed(Table::Clients)
            .eq("client_id", client_id)
            .is_null("parent_id");
        Ok(self.folders.list_as(query).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn create_folder(
        &self,
        client_id: ClientId,
        name: &str,
        folder_type: FolderType,
        parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let me = self.session.require(Action::Documents)?;
        let new = NewFolder::new(Some(client_id), name, folder_type, parent_id, Some(me))?;
        Ok(self.folders.insert(&new).await?)
    }

    pub async fn documents(&self, folder_id: FolderId) -> AppResult<Vec<Document>> {
        self.session.require(Action::Documents)?;
        let query = self.documents.query().eq("folder_id", folder_id).newest_first();
        Ok(self.documents.list(query).await?)
    }
}
