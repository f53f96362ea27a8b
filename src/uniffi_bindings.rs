//! UniFFI bindings for recipe-saver
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! It wraps the async Rust API with synchronous methods that run on a tokio runtime
//! owned by the directory handle.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::accounts::{Registration, Session, UserProfile, DATE_OF_BIRTH_FORMAT};
use crate::chefs::Chef;
use crate::config::AppConfig;
use crate::error::{
    AuthError, FetchError, ModerationError, StartupError, StoreError, SubmissionError,
};
use crate::model::{Category, DocumentId, Recipe, RecipeDraft, SearchCriteria};
use crate::RecipeSaver;

// Re-export UniFFI macro
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// FFI-compatible category enum
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum FfiCategory {
    Breakfast,
    Soup,
    Salad,
    Appetizer,
    Main,
    Side,
    Dessert,
    Snack,
    Drink,
    /// A category written by another client that is not in the list above
    Other { value: String },
}

impl From<Category> for FfiCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Breakfast => FfiCategory::Breakfast,
            Category::Soup => FfiCategory::Soup,
            Category::Salad => FfiCategory::Salad,
            Category::Appetizer => FfiCategory::Appetizer,
            Category::Main => FfiCategory::Main,
            Category::Side => FfiCategory::Side,
            Category::Dessert => FfiCategory::Dessert,
            Category::Snack => FfiCategory::Snack,
            Category::Drink => FfiCategory::Drink,
            Category::Other(value) => FfiCategory::Other { value },
        }
    }
}

impl From<FfiCategory> for Category {
    fn from(category: FfiCategory) -> Self {
        match category {
            FfiCategory::Breakfast => Category::Breakfast,
            FfiCategory::Soup => Category::Soup,
            FfiCategory::Salad => Category::Salad,
            FfiCategory::Appetizer => Category::Appetizer,
            FfiCategory::Main => Category::Main,
            FfiCategory::Side => Category::Side,
            FfiCategory::Dessert => Category::Dessert,
            FfiCategory::Snack => Category::Snack,
            FfiCategory::Drink => Category::Drink,
            FfiCategory::Other { value } => Category::from_wire(&value),
        }
    }
}

/// FFI-compatible recipe structure
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipe {
    /// Session-local identifier, usable as a list key
    pub local_id: String,
    /// Store identifier used for approve and delete
    pub document_id: Option<String>,
    pub name: String,
    pub image: String,
    pub ingredients: String,
    pub directions: String,
    pub category: FfiCategory,
    pub date_published: String,
    pub chef_name: String,
    pub approved: bool,
}

impl From<Recipe> for FfiRecipe {
    fn from(recipe: Recipe) -> Self {
        FfiRecipe {
            local_id: recipe.id.to_string(),
            document_id: recipe.document_id.map(|id| id.to_string()),
            name: recipe.name,
            image: recipe.image,
            ingredients: recipe.ingredients,
            directions: recipe.directions,
            category: recipe.category.into(),
            date_published: recipe.date_published,
            chef_name: recipe.chef_name,
            approved: recipe.approved,
        }
    }
}

/// FFI-compatible submission form
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipeDraft {
    pub name: String,
    pub image: String,
    pub ingredients: String,
    pub directions: String,
    pub category: Option<FfiCategory>,
    pub chef_name: String,
}

impl From<FfiRecipeDraft> for RecipeDraft {
    fn from(draft: FfiRecipeDraft) -> Self {
        RecipeDraft {
            name: draft.name,
            image: draft.image,
            ingredients: draft.ingredients,
            directions: draft.directions,
            category: draft.category.map(Category::from),
            chef_name: draft.chef_name,
        }
    }
}

/// FFI-compatible search form. Empty strings are treated as "any".
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiSearchCriteria {
    pub name: Option<String>,
    pub chef_name: Option<String>,
    pub category: Option<FfiCategory>,
}

impl From<FfiSearchCriteria> for SearchCriteria {
    fn from(criteria: FfiSearchCriteria) -> Self {
        SearchCriteria {
            name: criteria.name,
            chef_name: criteria.chef_name,
            category: criteria.category.map(Category::from),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiVideo {
    pub caption: String,
    pub url: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiChef {
    pub name: String,
    pub channel: String,
    pub videos: Vec<FfiVideo>,
}

impl From<&Chef> for FfiChef {
    fn from(chef: &Chef) -> Self {
        FfiChef {
            name: chef.name.clone(),
            channel: chef.channel.clone(),
            videos: chef
                .videos
                .iter()
                .map(|video| FfiVideo {
                    caption: video.caption.clone(),
                    url: video.url.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiSession {
    pub uid: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        FfiSession {
            is_admin: session.is_admin(),
            uid: session.user.uid,
            email: session.user.email,
        }
    }
}

/// Sign-up form contents. `date_of_birth` is `YYYY-MM-DD` when given.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub date_of_birth: Option<String>,
}

impl TryFrom<FfiRegistration> for Registration {
    type Error = FfiError;

    fn try_from(form: FfiRegistration) -> Result<Self, Self::Error> {
        Ok(Registration {
            date_of_birth: parse_date_of_birth(form.date_of_birth.as_deref())?,
            username: form.username,
            email: form.email,
            password: form.password,
            confirm_password: form.confirm_password,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiUserProfile {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: Option<String>,
}

impl From<UserProfile> for FfiUserProfile {
    fn from(profile: UserProfile) -> Self {
        FfiUserProfile {
            uid: profile.uid,
            username: profile.username,
            email: profile.email,
            date_of_birth: profile
                .date_of_birth
                .map(|date| date.format(DATE_OF_BIRTH_FORMAT).to_string()),
        }
    }
}

/// Empty input means no date was picked
fn parse_date_of_birth(value: Option<&str>) -> Result<Option<NaiveDate>, FfiError> {
    match value {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_OF_BIRTH_FORMAT)
            .map(Some)
            .map_err(|_| FfiError::Validation {
                message: format!("date of birth must be YYYY-MM-DD, got '{}'", value),
            }),
    }
}

/// Connection settings supplied by the host app
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiBackendConfig {
    pub project_id: String,
    pub api_key: String,
    /// Optional timeout in seconds (uses default if not specified)
    pub timeout_seconds: Option<u64>,
}

/// FFI-compatible error type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiError {
    /// A form field is missing or invalid
    Validation { message: String },
    /// The recipe no longer exists
    NotFound { message: String },
    /// The backend did not answer in time
    Timeout { message: String },
    /// The document store reported a failure
    Store { message: String },
    /// Sign-in or account failure, message from the auth service
    Auth { message: String },
    /// The signed-in user may not perform this action
    Forbidden { message: String },
    /// Configuration error
    Config { message: String },
    /// Runtime error (tokio)
    Runtime { message: String },
}

impl fmt::Display for FfiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiError::Validation { message } => write!(f, "Validation error: {}", message),
            FfiError::NotFound { message } => write!(f, "Not found: {}", message),
            FfiError::Timeout { message } => write!(f, "Timeout: {}", message),
            FfiError::Store { message } => write!(f, "Store error: {}", message),
            FfiError::Auth { message } => write!(f, "Auth error: {}", message),
            FfiError::Forbidden { message } => write!(f, "Forbidden: {}", message),
            FfiError::Config { message } => write!(f, "Config error: {}", message),
            FfiError::Runtime { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiError {}

impl From<StoreError> for FfiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => FfiError::NotFound {
                message: err.to_string(),
            },
            StoreError::Config(_) => FfiError::Config {
                message: err.to_string(),
            },
            _ => FfiError::Store {
                message: err.to_string(),
            },
        }
    }
}

impl From<FetchError> for FfiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(_) => FfiError::Timeout {
                message: err.to_string(),
            },
            FetchError::Store(e) => e.into(),
        }
    }
}

impl From<SubmissionError> for FfiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(e) => FfiError::Validation {
                message: e.to_string(),
            },
            SubmissionError::Timeout(_) => FfiError::Timeout {
                message: err.to_string(),
            },
            SubmissionError::Store(e) => e.into(),
        }
    }
}

impl From<ModerationError> for FfiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::NotFound(_) => FfiError::NotFound {
                message: err.to_string(),
            },
            ModerationError::Timeout(_) => FfiError::Timeout {
                message: err.to_string(),
            },
            ModerationError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for FfiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(message) => FfiError::Validation { message },
            AuthError::PasswordMismatch => FfiError::Validation {
                message: err.to_string(),
            },
            AuthError::Forbidden => FfiError::Forbidden {
                message: err.to_string(),
            },
            AuthError::Timeout(_) => FfiError::Timeout {
                message: err.to_string(),
            },
            AuthError::Store(e) => e.into(),
            _ => FfiError::Auth {
                message: err.to_string(),
            },
        }
    }
}

impl From<StartupError> for FfiError {
    fn from(err: StartupError) -> Self {
        FfiError::Config {
            message: err.to_string(),
        }
    }
}

/// Create a new tokio runtime for FFI calls
fn create_runtime() -> Result<tokio::runtime::Runtime, FfiError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiError::Runtime {
        message: format!("Failed to create async runtime: {}", e),
    })
}

/// Handle the mobile app holds for the lifetime of a signed-in screen stack
#[cfg_attr(feature = "uniffi", derive(uniffi::Object))]
pub struct FfiRecipeDirectory {
    runtime: tokio::runtime::Runtime,
    app: RecipeSaver,
}

impl FfiRecipeDirectory {
    /// Wrap an already assembled app
    pub fn from_app(app: RecipeSaver) -> Result<Self, FfiError> {
        Ok(FfiRecipeDirectory {
            runtime: create_runtime()?,
            app,
        })
    }

    fn require_admin(&self) -> Result<(), FfiError> {
        let session = self
            .app
            .accounts
            .current_session()
            .ok_or(AuthError::NotSignedIn)?;
        session.require_admin()?;
        Ok(())
    }
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
impl FfiRecipeDirectory {
    /// Connect to the hosted backend
    #[cfg_attr(feature = "uniffi", uniffi::constructor)]
    pub fn new(config: FfiBackendConfig) -> Result<Arc<Self>, FfiError> {
        let mut app_config = AppConfig::default();
        app_config.backend.project_id = Some(config.project_id);
        app_config.backend.api_key = Some(config.api_key);
        if let Some(timeout) = config.timeout_seconds {
            app_config.directory.timeout = timeout;
        }

        let app = RecipeSaver::from_config(&app_config)?;
        Ok(Arc::new(Self::from_app(app)?))
    }

    /// Approved recipes for the home screen
    pub fn list_approved(&self) -> Result<Vec<FfiRecipe>, FfiError> {
        let recipes = self
            .runtime
            .block_on(self.app.directory.list_approved())?;
        Ok(recipes.into_iter().map(FfiRecipe::from).collect())
    }

    pub fn search(&self, criteria: FfiSearchCriteria) -> Result<Vec<FfiRecipe>, FfiError> {
        let criteria = SearchCriteria::from(criteria);
        let recipes = self
            .runtime
            .block_on(self.app.directory.search(&criteria))?;
        Ok(recipes.into_iter().map(FfiRecipe::from).collect())
    }

    /// Moderation queue (admin only)
    pub fn list_pending(&self) -> Result<Vec<FfiRecipe>, FfiError> {
        self.require_admin()?;
        let recipes = self.runtime.block_on(self.app.directory.list_pending())?;
        Ok(recipes.into_iter().map(FfiRecipe::from).collect())
    }

    /// Submit a recipe for review, returning its document id
    pub fn submit(&self, draft: FfiRecipeDraft) -> Result<String, FfiError> {
        let draft = RecipeDraft::from(draft);
        let id = self.runtime.block_on(self.app.directory.submit(&draft))?;
        Ok(id.to_string())
    }

    /// Approve a pending recipe (admin only)
    pub fn approve(&self, document_id: String) -> Result<(), FfiError> {
        self.require_admin()?;
        let id = DocumentId::new(document_id);
        self.runtime.block_on(self.app.directory.approve(&id))?;
        Ok(())
    }

    /// Delete a recipe (admin only)
    pub fn delete(&self, document_id: String) -> Result<(), FfiError> {
        self.require_admin()?;
        let id = DocumentId::new(document_id);
        self.runtime.block_on(self.app.directory.delete(&id))?;
        Ok(())
    }

    pub fn sign_in(&self, email: String, password: String) -> Result<FfiSession, FfiError> {
        let session = self
            .runtime
            .block_on(self.app.accounts.sign_in(&email, &password))?;
        Ok(session.into())
    }

    pub fn sign_out(&self) -> Result<(), FfiError> {
        self.runtime.block_on(self.app.accounts.sign_out())?;
        Ok(())
    }

    pub fn current_session(&self) -> Option<FfiSession> {
        self.app.accounts.current_session().map(FfiSession::from)
    }

    /// Create an account, sign it in and store its profile
    pub fn register(&self, form: FfiRegistration) -> Result<FfiSession, FfiError> {
        let registration = Registration::try_from(form)?;
        let session = self
            .runtime
            .block_on(self.app.accounts.register(&registration))?;
        Ok(session.into())
    }

    /// Profile of the signed-in user
    pub fn profile(&self) -> Result<FfiUserProfile, FfiError> {
        let profile = self.runtime.block_on(self.app.accounts.profile())?;
        Ok(profile.into())
    }

    pub fn update_profile(
        &self,
        username: String,
        email: String,
        date_of_birth: Option<String>,
    ) -> Result<FfiUserProfile, FfiError> {
        let date_of_birth = parse_date_of_birth(date_of_birth.as_deref())?;
        let profile = self.runtime.block_on(self.app.accounts.update_profile(
            &username,
            &email,
            date_of_birth,
        ))?;
        Ok(profile.into())
    }

    /// Delete the signed-in account
    pub fn delete_account(&self) -> Result<(), FfiError> {
        self.runtime.block_on(self.app.accounts.delete_account())?;
        Ok(())
    }

    /// Featured chefs from the bundled catalog
    pub fn chefs(&self) -> Vec<FfiChef> {
        self.app.chefs.iter().map(FfiChef::from).collect()
    }

    /// Request timeout currently in effect, in seconds
    pub fn timeout_seconds(&self) -> u64 {
        self.app.directory.policy().timeout().as_secs()
    }
}

/// Every category a user can pick, in display order
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn available_categories() -> Vec<FfiCategory> {
    Category::KNOWN.into_iter().map(FfiCategory::from).collect()
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Default request timeout, in seconds
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn default_timeout_seconds() -> u64 {
    AppConfig::default().directory.timeout
}
