//! Typed repositories layered over the row contract.

use std::marker::PhantomData;
use std::sync::Arc;

use auditdesk_core::Entity;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::query::Query;
use crate::store::{DataAccessError, DataResult, DataStore, from_row, to_row};

/// Reads and writes records of `T` through a [`DataStore`], converting rows
/// with serde. Join views (`TaskWithClient`, ...) are read with
/// [`Repository::list_as`].
pub struct Repository<T> {
    store: Arc<dyn DataStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Entity + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// A query over this repository's table.
    pub fn query(&self) -> Query {
        Query::table(T::TABLE)
    }

    fn check(&self, query: &Query) -> DataResult<()> {
        if query.target() != T::TABLE {
            return Err(DataAccessError::InvalidQuery(format!(
                "query targets {} but repository reads {}",
                query.target(),
                T::TABLE
            )));
        }
        Ok(())
    }

    pub async fn list(&self, query: Query) -> DataResult<Vec<T>> {
        self.list_as(query).await
    }

    /// List rows decoded as `V` (a record plus its embeds).
    pub async fn list_as<V: DeserializeOwned>(&self, query: Query) -> DataResult<Vec<V>> {
        self.check(&query)?;
        self.store
            .select(&query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    pub async fn get(&self, id: T::Id) -> DataResult<Option<T>> {
        let uuid: uuid::Uuid = id.into();
        let query = self.query().eq("id", uuid).limit(1);
        Ok(self.list(query).await?.into_iter().next())
    }

    pub async fn count(&self, query: Query) -> DataResult<u64> {
        self.check(&query)?;
        self.store.count(&query).await
    }

    pub async fn insert<N: Serialize + ?Sized>(&self, new: &N) -> DataResult<T> {
        let row = self.store.insert(T::TABLE, to_row(new)?).await?;
        from_row(row)
    }

    pub async fn update<P: Serialize + ?Sized>(&self, id: T::Id, patch: &P) -> DataResult<T> {
        let row = self.store.update(T::TABLE, id.into(), to_row(patch)?).await?;
        from_row(row)
    }

    pub async fn delete(&self, id: T::Id) -> DataResult<()> {
        self.store.delete(T::TABLE, id.into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use auditdesk_core::{Client, ClientForm, Table, Task, TaskWithClient};

    #[tokio::test]
    async fn typed_round_trip_through_rows() {
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let clients = Repository::<Client>::new(store.clone());
        let new = ClientForm {
            name: "ABC Şirketi".into(),
            ..Default::default()
        }
        .into_new(None)
        .unwrap();
        let created = clients.insert(&new).await.unwrap();
        assert_eq!(created.name, "ABC Şirketi");
        assert_eq!(clients.get(created.id).await.unwrap(), Some(created.clone()));
        clients.delete(created.id).await.unwrap();
        assert_eq!(clients.get(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_for_another_table_is_rejected() {
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let tasks = Repository::<Task>::new(store);
        let err = tasks
            .list_as::<TaskWithClient>(Query::table(Table::Clients))
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::InvalidQuery(_)));
    }
}
