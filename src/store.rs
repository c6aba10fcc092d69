//! Access to the document store backing the loaders.
//!
//! Queries follow the shape the loaders need and nothing more: select documents from one table
//! whose secondary index value is one of a set of keys, then narrow them with filters. The same
//! query value addresses the rows an update patches.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field == value`
    Eq(String, Value),
    /// `field` is one of `values`
    In(String, Vec<Value>),
    /// The array at `field` does not contain `value`. A missing field counts as not containing it.
    NotContains(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_owned(), value.into())
    }

    pub fn is_in<I, T>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Filter::In(field.to_owned(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_contains(field: &str, value: impl Into<Value>) -> Self {
        Filter::NotContains(field.to_owned(), value.into())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::In(field, values) => doc.get(field).is_some_and(|v| values.contains(v)),
            Filter::NotContains(field, value) => match doc.get(field) {
                Some(Value::Array(items)) => !items.contains(value),
                _ => true,
            },
        }
    }
}

/// `table.getAll(keys, {index}).filter(..)...`
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub index: String,
    pub keys: Vec<Value>,
    pub filters: Vec<Filter>,
}

impl Query {
    /// Selects the documents of `table` whose `index` field equals one of `keys`.
    pub fn get_all<I, T>(table: &str, index: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            table: table.to_owned(),
            index: index.to_owned(),
            keys: keys.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.index).is_some_and(|v| self.keys.contains(v))
            && self.filters.iter().all(|f| f.matches(doc))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs a query, returning matching documents in no particular order.
    async fn run(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Merges `patch` into every document the query matches. Returns the number of documents
    /// changed.
    async fn update(&self, query: &Query, patch: Document) -> Result<usize, StoreError>;
}

/// Decodes raw documents into a record type.
pub fn decode<T: DeserializeOwned>(table: &str, docs: Vec<Document>) -> Result<Vec<T>, StoreError> {
    docs.into_iter()
        .map(|doc| {
            serde_json::from_value(Value::Object(doc))
                .map_err(|source| StoreError::Decode { table: table.to_owned(), source })
        })
        .collect()
}

/// In-process [`DocumentStore`] that keeps every table in memory and records the queries and
/// updates it serves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Document>>>,
    queries: Mutex<Vec<Query>>,
    updates: Mutex<Vec<(Query, Document)>>,
    failing_tables: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document to `table`. Non-object values are ignored.
    pub fn insert(&self, table: &str, doc: Value) {
        if let Value::Object(doc) = doc {
            self.tables.lock().entry(table.to_owned()).or_default().push(doc);
        }
    }

    /// Makes every query and update against `table` fail.
    pub fn fail_table(&self, table: &str) {
        self.failing_tables.lock().push(table.to_owned());
    }

    /// Every query run so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().clone()
    }

    /// Queries run so far against `table`.
    pub fn queries_for(&self, table: &str) -> Vec<Query> {
        self.queries.lock().iter().filter(|q| q.table == table).cloned().collect()
    }

    /// Every update applied so far, in order.
    pub fn updates(&self) -> Vec<(Query, Document)> {
        self.updates.lock().clone()
    }

    /// Current contents of `table`.
    pub fn documents(&self, table: &str) -> Vec<Document> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    fn check_table(&self, table: &str) -> Result<(), StoreError> {
        if self.failing_tables.lock().iter().any(|t| t == table) {
            return Err(StoreError::Query {
                table: table.to_owned(),
                message: "table unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.queries.lock().push(query.clone());
        self.check_table(&query.table)?;
        let tables = self.tables.lock();
        let docs = tables
            .get(&query.table)
            .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
            .unwrap_or_default();
        Ok(docs)
    }

    async fn update(&self, query: &Query, patch: Document) -> Result<usize, StoreError> {
        self.updates.lock().push((query.clone(), patch.clone()));
        self.check_table(&query.table)?;
        let mut tables = self.tables.lock();
        let mut changed = 0;
        if let Some(docs) = tables.get_mut(&query.table) {
            for doc in docs.iter_mut().filter(|doc| query.matches(doc)) {
                for (field, value) in patch.iter() {
                    doc.insert(field.clone(), value.clone());
                }
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn task_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("Task", json!({"id": "t1", "userId": "u1", "teamId": "a", "tags": []}));
        store.insert(
            "Task",
            json!({"id": "t2", "userId": "u1", "teamId": "b", "tags": ["archived"]}),
        );
        store.insert("Task", json!({"id": "t3", "userId": "u2", "teamId": "a"}));
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        let mut ids = docs
            .iter()
            .filter_map(|d| d.get("id").and_then(Value::as_str))
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn get_all_then_filter() {
        let store = task_store();
        let query = Query::get_all("Task", "userId", ["u1", "u2"])
            .filter(Filter::is_in("teamId", ["a", "b"]))
            .filter(Filter::not_contains("tags", "archived"));
        let docs = store.run(&query).await.unwrap();
        assert_eq!(ids(&docs), vec!["t1", "t3"]);
        assert_eq!(store.queries(), vec![query]);
    }

    #[tokio::test]
    async fn update_patches_matching_documents() {
        let store = task_store();
        let query = Query::get_all("Task", "userId", ["u1"]).filter(Filter::eq("teamId", "a"));
        let mut patch = Document::new();
        patch.insert("content".to_owned(), json!("done"));
        assert_eq!(store.update(&query, patch).await.unwrap(), 1);

        let docs = store.documents("Task");
        let t1 = docs.iter().find(|d| d["id"] == "t1").unwrap();
        assert_eq!(t1["content"], "done");
        assert!(docs.iter().filter(|d| d["id"] != "t1").all(|d| d.get("content").is_none()));
    }

    #[tokio::test]
    async fn failing_table_errors() {
        let store = task_store();
        store.fail_table("Task");
        let err = store.run(&Query::get_all("Task", "id", ["t1"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Query { ref table, .. } if table == "Task"));
    }

    #[test]
    fn decode_reports_table() {
        let mut doc = Document::new();
        doc.insert("id".to_owned(), json!(7));
        let err = decode::<crate::records::Task>("Task", vec![doc]).unwrap_err();
        assert!(err.to_string().starts_with("could not decode Task document"));
    }
}
