use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use auditdesk_core::{Cardinality, Relation, Table};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::query::{Direction, Order, Query, empty_embed};
use crate::store::{DataAccessError, DataResult, DataStore, Row};

/// Store operation, used to target injected failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Count,
    Insert,
    Upsert,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, Vec<Row>>,
    last_stamp: Option<DateTime<Utc>>,
}

/// In-memory relational store for tests/dev.
///
/// Mirrors the remote store's observable behaviour: assigned ids and
/// timestamps, last-write-wins updates, no cascades, null/empty embeds for
/// missing related rows.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
    failures: Mutex<Vec<(Table, StoreOp, DataAccessError)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `op` on `table` fail with a 500.
    pub fn fail_next(&self, table: Table, op: StoreOp) {
        self.fail_next_with(table, op, DataAccessError::api(500, "injected failure"));
    }

    pub fn fail_next_with(&self, table: Table, op: StoreOp, err: DataAccessError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((table, op, err));
        }
    }

    /// Snapshot of a table, in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Row> {
        match self.inner.read() {
            Ok(t) => t.rows.get(&table).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    pub fn len(&self, table: Table) -> usize {
        match self.inner.read() {
            Ok(t) => t.rows.get(&table).map_or(0, Vec::len),
            Err(_) => 0,
        }
    }

    fn take_failure(&self, table: Table, op: StoreOp) -> DataResult<()> {
        let Ok(mut failures) = self.failures.lock() else {
            return Ok(());
        };
        match failures.iter().position(|(t, o, _)| *t == table && *o == op) {
            Some(i) => Err(failures.remove(i).2),
            None => Ok(()),
        }
    }

    fn read(&self) -> DataResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| DataAccessError::Network("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> DataResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| DataAccessError::Network("in-memory store lock poisoned".into()))
    }
}

impl Tables {
    /// Strictly increasing `created_at`, so newest-first ordering is total.
    fn stamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn with_defaults(&mut self, mut row: Row) -> Row {
        if is_null(row.get("id")) {
            row.insert("id".into(), Value::String(Uuid::now_v7().to_string()));
        }
        if is_null(row.get("created_at")) {
            let ts = self.stamp();
            row.insert("created_at".into(), Value::String(ts));
        }
        row
    }

    fn resolve_embed(&self, row: &Row, rel: &Relation) -> Value {
        let related = self.rows.get(&rel.to).map(Vec::as_slice).unwrap_or(&[]);
        match rel.cardinality {
            Cardinality::ToOne => match row.get(rel.column) {
                Some(fk) if !fk.is_null() => related
                    .iter()
                    .find(|r| r.get("id") == Some(fk))
                    .map(|r| Value::Object(r.clone()))
                    .unwrap_or_else(|| empty_embed(rel.cardinality)),
                _ => empty_embed(rel.cardinality),
            },
            Cardinality::ToMany => {
                let Some(id) = row.get("id") else {
                    return empty_embed(rel.cardinality);
                };
                Value::Array(
                    related
                        .iter()
                        .filter(|r| r.get(rel.column) == Some(id))
                        .map(|r| Value::Object(r.clone()))
                        .collect(),
                )
            }
        }
    }
}

fn is_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn id_matches(row: &Row, id: &Uuid) -> bool {
    match row.get("id") {
        Some(Value::String(s)) => Uuid::parse_str(s).is_ok_and(|u| u == *id),
        _ => false,
    }
}

/// Postgres defaults: nulls sort last ascending, first descending.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn sort_rows(rows: &mut [Row], order: &[Order]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for o in order {
            let ord = compare(a.get(&o.column), b.get(&o.column));
            let ord = match o.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn matches_filters(row: &Row, query: &Query) -> bool {
    query.filters().iter().all(|f| f.matches(row.get(f.column())))
}

#[async_trait::async_trait]
impl DataStore for InMemoryStore {
    async fn select(&self, query: &Query) -> DataResult<Vec<Row>> {
        self.take_failure(query.target(), StoreOp::Select)?;
        let relations = query.relations()?;
        let tables = self.read()?;

        let mut out: Vec<Row> = tables
            .rows
            .get(&query.target())
            .map(|rows| rows.iter().filter(|r| matches_filters(r, query)).cloned().collect())
            .unwrap_or_default();
        sort_rows(&mut out, query.ordering());
        if let Some(n) = query.row_limit() {
            out.truncate(n);
        }
        for row in &mut out {
            for rel in &relations {
                let embedded = tables.resolve_embed(row, rel);
                row.insert(rel.to.as_str().to_string(), embedded);
            }
        }
        Ok(out)
    }

    async fn count(&self, query: &Query) -> DataResult<u64> {
        self.take_failure(query.target(), StoreOp::Count)?;
        let tables = self.read()?;
        let n = tables
            .rows
            .get(&query.target())
            .map_or(0, |rows| rows.iter().filter(|r| matches_filters(r, query)).count());
        Ok(n as u64)
    }

    async fn insert(&self, table: Table, row: Row) -> DataResult<Row> {
        self.take_failure(table, StoreOp::Insert)?;
        let mut tables = self.write()?;
        let row = tables.with_defaults(row);
        let rows = tables.rows.entry(table).or_default();
        if rows.iter().any(|r| r.get("id") == row.get("id")) {
            return Err(DataAccessError::api(
                409,
                format!("duplicate key value violates unique constraint \"{table}_pkey\""),
            ));
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn upsert(&self, table: Table, rows: Vec<Row>, on_conflict: &str) -> DataResult<Vec<Row>> {
        self.take_failure(table, StoreOp::Upsert)?;
        let mut tables = self.write()?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get(on_conflict).filter(|v| !v.is_null()).cloned();
            let existing = key.as_ref().and_then(|key| {
                tables
                    .rows
                    .get(&table)
                    .and_then(|rs| rs.iter().position(|r| r.get(on_conflict) == Some(key)))
            });
            match existing {
                Some(i) => {
                    let target = &mut tables.rows.entry(table).or_default()[i];
                    for (k, v) in row {
                        target.insert(k, v);
                    }
                    out.push(target.clone());
                }
                None => {
                    let row = tables.with_defaults(row);
                    tables.rows.entry(table).or_default().push(row.clone());
                    out.push(row);
                }
            }
        }
        Ok(out)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> DataResult<Row> {
        self.take_failure(table, StoreOp::Update)?;
        let mut tables = self.write()?;
        let target = tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| id_matches(r, &id)))
            .ok_or(DataAccessError::NotFound { table, id })?;
        for (k, v) in patch {
            if k != "id" {
                target.insert(k, v);
            }
        }
        Ok(target.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> DataResult<()> {
        self.take_failure(table, StoreOp::Delete)?;
        let mut tables = self.write()?;
        if let Some(rows) = tables.rows.get_mut(&table) {
            rows.retain(|r| !id_matches(r, &id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_row;
    use proptest::prelude::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        to_row(&v).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let store = InMemoryStore::new();
        let r = store.insert(Table::Clients, row(json!({"name": "ABC"}))).await.unwrap();
        assert!(Uuid::parse_str(r["id"].as_str().unwrap()).is_ok());
        assert!(r["created_at"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
    }

    #[tokio::test]
    async fn newest_first_is_total_even_for_rapid_inserts() {
        let store = InMemoryStore::new();
        for name in ["a", "b", "c", "d"] {
            store.insert(Table::Clients, row(json!({"name": name}))).await.unwrap();
        }
        let rows = store.select(&Query::table(Table::Clients).newest_first()).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["d", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn to_one_embed_of_missing_parent_is_null() {
        let store = InMemoryStore::new();
        store
            .insert(
                Table::Tasks,
                row(json!({"title": "t", "client_id": Uuid::now_v7().to_string(), "status": "pending"})),
            )
            .await
            .unwrap();
        let rows = store
            .select(&Query::table(Table::Tasks).embed(Table::Clients))
            .await
            .unwrap();
        assert_eq!(rows[0]["clients"], Value::Null);
    }

    #[tokio::test]
    async fn to_many_embed_without_children_is_empty() {
        let store = InMemoryStore::new();
        let list = store.insert(Table::Checklists, row(json!({"title": "x"}))).await.unwrap();
        store
            .insert(
                Table::ChecklistItems,
                row(json!({"checklist_id": Uuid::now_v7().to_string(), "description": "other", "order_index": 1})),
            )
            .await
            .unwrap();
        let rows = store
            .select(&Query::table(Table::Checklists).embed(Table::ChecklistItems))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], list["id"]);
        assert_eq!(rows[0]["checklist_items"], json!([]));
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_key() {
        let store = InMemoryStore::new();
        let id = "10000000-0000-0000-0000-000000000001";
        for name in ["first", "second"] {
            store
                .upsert(Table::Clients, vec![row(json!({"id": id, "name": name}))], "id")
                .await
                .unwrap();
        }
        let rows = store.rows(Table::Clients);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "second");
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = InMemoryStore::new();
        let id = Uuid::now_v7();
        let err = store.update(Table::Tasks, id, Row::new()).await.unwrap_err();
        assert_eq!(err, DataAccessError::NotFound { table: Table::Tasks, id });
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryStore::new();
        store.fail_next(Table::Profiles, StoreOp::Insert);
        assert!(store.insert(Table::Profiles, Row::new()).await.is_err());
        assert!(store.insert(Table::Profiles, Row::new()).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryStore::new();
        let r = row(json!({"id": "10000000-0000-0000-0000-000000000001"}));
        store.insert(Table::Clients, r.clone()).await.unwrap();
        let err = store.insert(Table::Clients, r).await.unwrap_err();
        assert!(matches!(err, DataAccessError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending() {
        let store = InMemoryStore::new();
        for due in [json!(null), json!("2026-02-01"), json!("2026-01-01")] {
            store.insert(Table::Tasks, row(json!({"due_date": due}))).await.unwrap();
        }
        let rows = store
            .select(&Query::table(Table::Tasks).order_by("due_date", Direction::Asc))
            .await
            .unwrap();
        let dues: Vec<&Value> = rows.iter().map(|r| &r["due_date"]).collect();
        assert_eq!(dues, vec![&json!("2026-01-01"), &json!("2026-02-01"), &Value::Null]);
    }

    fn numbered(values: &[Option<i64>]) -> Vec<Row> {
        values.iter().map(|n| row(json!({ "n": n }))).collect()
    }

    fn column(rows: &[Row]) -> Vec<Option<i64>> {
        rows.iter().map(|r| r["n"].as_i64()).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn ascending_sort_is_ordered_with_nulls_last(values in prop::collection::vec(prop::option::of(-50i64..50), 0..24)) {
            let mut rows = numbered(&values);
            sort_rows(&mut rows, &[Order { column: "n".into(), direction: Direction::Asc }]);
            let sorted = column(&rows);
            prop_assert_eq!(sorted.len(), values.len());
            let nulls = sorted.iter().position(Option::is_none).unwrap_or(sorted.len());
            prop_assert!(sorted[nulls..].iter().all(Option::is_none));
            prop_assert!(sorted[..nulls].windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn descending_sort_puts_nulls_first(values in prop::collection::vec(prop::option::of(-50i64..50), 0..24)) {
            let mut rows = numbered(&values);
            sort_rows(&mut rows, &[Order { column: "n".into(), direction: Direction::Desc }]);
            let sorted = column(&rows);
            let first = sorted.iter().position(Option::is_some).unwrap_or(sorted.len());
            prop_assert!(sorted[..first].iter().all(Option::is_none));
            prop_assert!(sorted[first..].iter().all(Option::is_some));
            prop_assert!(sorted[first..].windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
