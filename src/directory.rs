//! Recipe Directory Service.
//!
//! The only path presentation code uses to read or write recipes. Every read
//! is a fresh query against the store with the moderation predicate applied;
//! nothing is cached between calls.

use std::sync::Arc;

use chrono::Local;
use log::{debug, info, warn};

use crate::config::DirectoryConfig;
use crate::error::{FetchError, ModerationError, StoreError, SubmissionError};
use crate::mapper::{approval_fields, map_document, submission_fields};
use crate::model::{DocumentId, Recipe, RecipeDraft, SearchCriteria};
use crate::moderation::ModerationState;
use crate::policy::{CallFailure, CallPolicy};
use crate::query::QueryBuilder;
use crate::store::DocumentStore;

/// Format of the `datePublished` stamp written on submission
pub const DATE_PUBLISHED_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Clone)]
pub struct RecipeDirectory {
    store: Arc<dyn DocumentStore>,
    policy: CallPolicy,
    collection: String,
}

impl RecipeDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        RecipeDirectory {
            store,
            policy: CallPolicy::default(),
            collection: "Recipes".to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &DirectoryConfig) -> Self {
        Self::new(store)
            .with_policy(CallPolicy::from_config(config))
            .with_collection(config.collection.clone())
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.policy
    }

    /// Every approved recipe
    pub async fn list_approved(&self) -> Result<Vec<Recipe>, FetchError> {
        self.fetch(ModerationState::Approved, &SearchCriteria::default())
            .await
    }

    /// Approved recipes matching every given criterion exactly
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Recipe>, FetchError> {
        if criteria.is_empty() {
            debug!("Search without criteria lists every approved recipe");
        }
        self.fetch(ModerationState::Approved, criteria).await
    }

    /// The admin moderation queue: every recipe not yet approved
    pub async fn list_pending(&self) -> Result<Vec<Recipe>, FetchError> {
        self.fetch(ModerationState::Pending, &SearchCriteria::default())
            .await
    }

    async fn fetch(
        &self,
        state: ModerationState,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Recipe>, FetchError> {
        let query = QueryBuilder::new(self.collection.as_str())
            .moderation(state)
            .criteria(criteria)
            .build();
        debug!("Fetching {:?} recipes with {:?}", state, query.filters());

        let documents = self
            .policy
            .read("fetch recipes", || self.store.run_query(&query))
            .await
            .map_err(|failure| match failure {
                CallFailure::Timeout(limit) => FetchError::Timeout(limit),
                CallFailure::Failed(e) => FetchError::Store(e),
            })?;

        let total = documents.len();
        let recipes: Vec<Recipe> = documents
            .iter()
            .filter_map(|document| match map_document(document) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!("Skipping recipe: {}", e);
                    None
                }
            })
            .filter(|recipe| state.admits(recipe))
            .collect();

        if recipes.len() < total {
            warn!("Returned {} of {} recipe documents", recipes.len(), total);
        }
        Ok(recipes)
    }

    /// Validate and persist a new pending recipe, returning its store id.
    ///
    /// Validation happens before any network call; an invalid draft never
    /// reaches the store.
    pub async fn submit(&self, draft: &RecipeDraft) -> Result<DocumentId, SubmissionError> {
        let validated = draft.validate()?;
        let date_published = Local::now().format(DATE_PUBLISHED_FORMAT).to_string();
        let fields = submission_fields(&validated, &date_published);

        let id = self
            .policy
            .write("add recipe", self.store.create(&self.collection, fields))
            .await
            .map_err(|failure| match failure {
                CallFailure::Timeout(limit) => SubmissionError::Timeout(limit),
                CallFailure::Failed(e) => SubmissionError::Store(e),
            })?;

        info!("Recipe '{}' submitted as {}", draft.name, id);
        Ok(DocumentId::new(id))
    }

    /// Mark a recipe approved. Approving twice is not an error.
    pub async fn approve(&self, id: &DocumentId) -> Result<(), ModerationError> {
        let result = self
            .policy
            .write(
                "approve recipe",
                self.store
                    .update(&self.collection, id.as_str(), approval_fields()),
            )
            .await;
        moderation_result(id, result)?;
        info!("Recipe {} approved", id);
        Ok(())
    }

    /// Remove a recipe in any moderation state
    pub async fn delete(&self, id: &DocumentId) -> Result<(), ModerationError> {
        let result = self
            .policy
            .write(
                "delete recipe",
                self.store.delete(&self.collection, id.as_str()),
            )
            .await;
        moderation_result(id, result)?;
        info!("Recipe {} deleted", id);
        Ok(())
    }
}

fn moderation_result(
    id: &DocumentId,
    result: Result<(), CallFailure<StoreError>>,
) -> Result<(), ModerationError> {
    result.map_err(|failure| match failure {
        CallFailure::Timeout(limit) => ModerationError::Timeout(limit),
        CallFailure::Failed(StoreError::NotFound(_)) => ModerationError::NotFound(id.clone()),
        CallFailure::Failed(e) => ModerationError::Store(e),
    })
}
