use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthProvider, AuthUser};
use crate::config::BackendConfig;
use crate::error::AuthError;

/// `AuthProvider` backed by the Identity Toolkit REST API (email/password)
pub struct IdentityToolkitAuth {
    client: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<AuthUser>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    id_token: String,
}

impl IdentityToolkitAuth {
    /// Create a new auth client from configuration
    pub fn new(config: &BackendConfig, api_key: Option<String>) -> Result<Self, AuthError> {
        let api_key = api_key.ok_or_else(|| {
            AuthError::Validation("backend API key not found in config or environment".to_string())
        })?;

        Ok(IdentityToolkitAuth {
            client: Client::new(),
            base_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key,
            session: RwLock::new(None),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        IdentityToolkitAuth {
            client: Client::new(),
            base_url,
            api_key,
            session: RwLock::new(None),
        }
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, AuthError> {
        debug!("accounts:{}", method);
        let response = self
            .client
            .post(format!("{}/v1/accounts:{}", self.base_url, method))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("authentication request failed")
                .to_string();
            return Err(AuthError::Remote(message));
        }
        Ok(body)
    }

    async fn authenticate(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = self
            .call(
                method,
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let account: AccountResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::Remote(format!("unexpected auth response: {}", e)))?;
        let user = AuthUser {
            uid: account.local_id,
            email: account.email,
            id_token: account.id_token,
        };
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    fn set_session(&self, user: Option<AuthUser>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitAuth {
    fn provider_name(&self) -> &str {
        "identity_toolkit"
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.authenticate("signUp", email, password).await?;
        info!("Created account {}", user.uid);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.authenticate("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.call("delete", json!({ "idToken": user.id_token }))
            .await?;
        self.set_session(None);
        info!("Deleted account {}", user.uid);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
