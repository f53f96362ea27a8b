use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Hosted backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Recipe directory behavior
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Who gets the admin role
    #[serde(default)]
    pub admin: AdminConfig,
    /// Chef catalog location
    #[serde(default)]
    pub chefs: ChefsConfig,
}

/// Connection settings for the hosted document database and auth service
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Project identifier on the hosted backend
    pub project_id: Option<String>,
    /// Web API key (can also be set via RECIPE_SAVER_API_KEY)
    pub api_key: Option<String>,
    /// Database name inside the project
    #[serde(default = "default_database")]
    pub database: String,
    /// Base URL of the document database REST API (for emulators or proxies)
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,
    /// Base URL of the auth REST API
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            database: default_database(),
            firestore_url: default_firestore_url(),
            auth_url: default_auth_url(),
        }
    }
}

/// Configuration for the recipe directory and its retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    /// Collection holding recipe documents
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Collection holding user profile documents
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Automatic retries for reads on transient failure (at most 1 is honored)
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    /// Delay before a read is retried, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            users_collection: default_users_collection(),
            timeout: default_timeout(),
            read_retries: default_read_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Accounts that sign in with the admin role
    #[serde(default = "default_admin_emails")]
    pub emails: Vec<String>,
}

impl AdminConfig {
    /// Case-insensitive match against the configured admin accounts
    pub fn is_admin(&self, email: &str) -> bool {
        self.emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            emails: default_admin_emails(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChefsConfig {
    /// Load chefs from this JSON file instead of the bundled list
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_collection() -> String {
    "Recipes".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_read_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_admin_emails() -> Vec<String> {
    vec!["admin@gmail.com".to_string()]
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_SAVER__ prefix
    /// 2. recipe_saver.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_SAVER__BACKEND__PROJECT_ID
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// API key from the config file, falling back to RECIPE_SAVER_API_KEY
    pub fn api_key(&self) -> Option<String> {
        self.backend
            .api_key
            .clone()
            .or_else(|| std::env::var("RECIPE_SAVER_API_KEY").ok())
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe_saver").required(false))
        // Use double underscore for nested: RECIPE_SAVER__DIRECTORY__TIMEOUT
        .add_source(
            Environment::with_prefix("RECIPE_SAVER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
