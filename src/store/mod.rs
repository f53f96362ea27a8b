mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::query::Query;

/// Field map of a single document, in plain JSON form
pub type Fields = Map<String, Value>;

/// A document as returned by the store, before entity mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub fields: Fields,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        RawDocument {
            id: id.into(),
            fields,
        }
    }
}

/// Client interface to the hosted document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the backend name (e.g., "firestore", "memory")
    fn backend_name(&self) -> &str;

    /// Return every document in the query's collection that satisfies all of
    /// its equality filters
    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>, StoreError>;

    /// Create a document with a store-assigned id and return that id
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Overwrite only the given fields of an existing document.
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Remove an existing document.
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Fetch one document by id
    async fn get(&self, collection: &str, id: &str) -> Result<RawDocument, StoreError>;

    /// Create or replace a document under a caller-chosen id
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Attach (or clear) the signed-in user's id token to subsequent requests
    fn authorize(&self, _id_token: Option<String>) {}
}
