use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::StoreError;
use crate::query::Query;
use crate::store::{DocumentStore, Fields, RawDocument};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// Process-local document store.
///
/// Stands in for the hosted database in tests and offline demos. It counts
/// calls, can delay every call, and can be told to fail upcoming calls.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<Collections>,
    failures: Mutex<VecDeque<StoreError>>,
    latency: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing call accounting
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Number of trait calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next call fail with `error`; queued failures are used in order
    pub fn fail_next(&self, error: StoreError) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(error);
    }

    /// Delay every subsequent call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self
            .latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = latency;
    }

    /// Snapshot of one document
    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.lock()
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self
            .latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn missing(collection: &str, id: &str) -> StoreError {
        StoreError::NotFound(format!("{}/{}", collection, id))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>, StoreError> {
        self.begin_call().await?;
        let collections = self.lock();
        let documents: Vec<RawDocument> = collections
            .get(query.collection())
            .into_iter()
            .flatten()
            .map(|(id, fields)| RawDocument::new(id.clone(), fields.clone()))
            .filter(|document| query.matches(document))
            .collect();
        debug!(
            "memory query on {} matched {} documents",
            query.collection(),
            documents.len()
        );
        Ok(documents)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.begin_call().await?;
        let id = format!("doc-{:06}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.insert(collection, &id, fields);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.begin_call().await?;
        let mut collections = self.lock();
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| Self::missing(collection, id))?;
        document.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.begin_call().await?;
        self.lock()
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .map(|_| ())
            .ok_or_else(|| Self::missing(collection, id))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<RawDocument, StoreError> {
        self.begin_call().await?;
        self.document(collection, id)
            .map(|fields| RawDocument::new(id, fields))
            .ok_or_else(|| Self::missing(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.begin_call().await?;
        self.insert(collection, id, fields);
        Ok(())
    }
}
