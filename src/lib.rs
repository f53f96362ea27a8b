pub mod accounts;
pub mod app;
pub mod auth;
pub mod chefs;
pub mod config;
pub mod directory;
pub mod error;
pub mod mapper;
pub mod model;
pub mod moderation;
pub mod policy;
pub mod query;
pub mod store;
pub mod uniffi_bindings;

pub use accounts::{AccountService, Registration, Role, Session, UserProfile};
pub use app::RecipeSaver;
pub use auth::{AuthProvider, AuthUser};
pub use chefs::{Chef, ChefCatalog, Video};
pub use config::AppConfig;
pub use directory::RecipeDirectory;
pub use error::{
    AuthError, ChefCatalogError, FetchError, MappingError, ModerationError, StartupError,
    StoreError, SubmissionError, ValidationError,
};
pub use model::{Category, DocumentId, Recipe, RecipeDraft, RecipeId, SearchCriteria};
pub use moderation::ModerationState;
pub use policy::CallPolicy;
pub use store::{DocumentStore, RawDocument};

/// Load configuration and connect to the hosted backend in one step
pub fn connect() -> Result<RecipeSaver, StartupError> {
    let config = AppConfig::load()?;
    RecipeSaver::from_config(&config)
}
