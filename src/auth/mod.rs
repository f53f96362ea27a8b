mod identity_toolkit;
mod memory;

pub use identity_toolkit::IdentityToolkitAuth;
pub use memory::InMemoryAuth;

use async_trait::async_trait;

use crate::error::AuthError;

/// The signed-in account as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    /// Token presented to the document store on behalf of this user
    pub id_token: String,
}

/// Client interface to the hosted authentication service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the provider name (e.g., "identity_toolkit", "memory")
    fn provider_name(&self) -> &str;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Forget the current session. Never contacts the service.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Permanently remove the signed-in account
    async fn delete_account(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<AuthUser>;
}
