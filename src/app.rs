use std::sync::Arc;

use log::info;

use crate::accounts::AccountService;
use crate::auth::{AuthProvider, IdentityToolkitAuth};
use crate::chefs::ChefCatalog;
use crate::config::AppConfig;
use crate::directory::RecipeDirectory;
use crate::error::StartupError;
use crate::store::{DocumentStore, FirestoreStore};

/// Everything the presentation layer needs, wired from one configuration
pub struct RecipeSaver {
    pub directory: RecipeDirectory,
    pub accounts: AccountService,
    pub chefs: ChefCatalog,
}

impl RecipeSaver {
    /// Connect to the hosted backend described by `config`.
    ///
    /// Fails if the chef catalog cannot be decoded; there is no fallback list.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let api_key = config.api_key();
        let store: Arc<dyn DocumentStore> =
            Arc::new(FirestoreStore::new(&config.backend, api_key.clone())?);
        let auth: Arc<dyn AuthProvider> =
            Arc::new(IdentityToolkitAuth::new(&config.backend, api_key)?);
        Self::with_backends(config, store, auth)
    }

    /// Assemble the app over caller-supplied store and auth clients
    pub fn with_backends(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, StartupError> {
        let chefs = match &config.chefs.path {
            Some(path) => ChefCatalog::load(path)?,
            None => ChefCatalog::bundled()?,
        };
        info!(
            "Using {} store, {} auth, {} chefs",
            store.backend_name(),
            auth.provider_name(),
            chefs.len()
        );

        Ok(RecipeSaver {
            directory: RecipeDirectory::from_config(store.clone(), &config.directory),
            accounts: AccountService::from_config(auth, store, config),
            chefs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryAuth;
    use crate::store::InMemoryStore;

    #[test]
    fn test_with_backends_uses_bundled_chefs() {
        let app = RecipeSaver::with_backends(
            &AppConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryAuth::new()),
        )
        .unwrap();
        assert!(!app.chefs.is_empty());
    }

    #[test]
    fn test_unreadable_chef_file_fails_startup() {
        let mut config = AppConfig::default();
        config.chefs.path = Some("/nonexistent/chefs.json".into());
        let result = RecipeSaver::with_backends(
            &config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryAuth::new()),
        );
        assert!(matches!(result, Err(StartupError::Chefs(_))));
    }

    #[test]
    fn test_from_config_requires_project() {
        let result = RecipeSaver::from_config(&AppConfig::default());
        assert!(matches!(result, Err(StartupError::Store(_))));
    }
}
