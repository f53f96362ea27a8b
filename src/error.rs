use std::time::Duration;

use thiserror::Error;

use crate::model::DocumentId;

/// A draft failed client-side validation. Raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was left empty
    #[error("{0} is required")]
    EmptyField(&'static str),

    /// No category was selected
    #[error("a category must be selected")]
    MissingCategory,

    /// The category is not one of the known values
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// A remote record could not be decoded into a `Recipe`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("document {document}: missing field '{field}'")]
    MissingField {
        document: String,
        field: &'static str,
    },

    #[error("document {document}: field '{field}' is not a {expected}")]
    WrongType {
        document: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("document {document}: field '{field}' is empty")]
    EmptyField {
        document: String,
        field: &'static str,
    },
}

/// Failures reported by a `DocumentStore` backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed document does not exist
    #[error("document not found: {0}")]
    NotFound(String),

    /// The HTTP request could not be completed
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The store answered with something we could not read
    #[error("malformed store response: {0}")]
    Decode(String),

    /// The store is temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend is misconfigured
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether a read that failed with this error may succeed if repeated
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Status { status, .. } => *status == 429 || *status >= 500,
            StoreError::Unavailable(_) => true,
            StoreError::NotFound(_) | StoreError::Decode(_) | StoreError::Config(_) => false,
        }
    }
}

/// A read (listing or search) failed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("fetching recipes timed out after {0:?}")]
    Timeout(Duration),

    #[error("error fetching recipes: {0}")]
    Store(#[from] StoreError),
}

/// A recipe submission failed
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("invalid recipe: {0}")]
    Validation(#[from] ValidationError),

    #[error("adding recipe timed out after {0:?}")]
    Timeout(Duration),

    #[error("error adding recipe: {0}")]
    Store(StoreError),
}

/// An approve or delete failed; the record keeps its prior state
#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("recipe {0} does not exist")]
    NotFound(DocumentId),

    #[error("moderation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("moderation request failed: {0}")]
    Store(StoreError),
}

/// Sign-in, sign-up and session failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Message passed through from the remote auth service
    #[error("{0}")]
    Remote(String),

    #[error("{0}")]
    Validation(String),

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("User not logged in.")]
    NotSignedIn,

    #[error("admin access required")]
    Forbidden,

    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("auth request timed out after {0:?}")]
    Timeout(Duration),

    #[error("profile storage failed: {0}")]
    Store(StoreError),
}

/// The bundled chef list could not be loaded
#[derive(Error, Debug)]
pub enum ChefCatalogError {
    #[error("could not read chef catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode chef catalog: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The app could not be assembled from its configuration
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("document store: {0}")]
    Store(#[from] StoreError),

    #[error("auth service: {0}")]
    Auth(#[from] AuthError),

    #[error("chef catalog: {0}")]
    Chefs(#[from] ChefCatalogError),
}
