//! Account registration, sign-in and user profiles.
//!
//! Profiles live in the `users` collection keyed by the auth uid. Signing in
//! hands the session token to the document store so later reads and writes
//! run as that user.

use std::sync::Arc;

use chrono::NaiveDate;
use log::info;
use serde_json::Value;

use crate::auth::{AuthProvider, AuthUser};
use crate::config::{AdminConfig, AppConfig};
use crate::error::{AuthError, StoreError};
use crate::policy::{CallFailure, CallPolicy};
use crate::store::{DocumentStore, Fields, RawDocument};

/// Format of the `dateOfBirth` profile field
pub const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: AuthUser,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail unless this session may moderate recipes
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Sign-up form contents
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl Registration {
    fn validate(&self) -> Result<(), AuthError> {
        if self.username.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(AuthError::Validation("All fields are required.".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl UserProfile {
    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("username".to_string(), Value::String(self.username.clone()));
        fields.insert("email".to_string(), Value::String(self.email.clone()));
        fields.insert(
            "dateOfBirth".to_string(),
            self.date_of_birth
                .map(|date| Value::String(date.format(DATE_OF_BIRTH_FORMAT).to_string()))
                .unwrap_or(Value::Null),
        );
        fields.insert("uid".to_string(), Value::String(self.uid.clone()));
        fields
    }

    /// Missing or mistyped profile fields read back as empty
    fn from_document(document: &RawDocument) -> Self {
        let text = |name: &str| {
            document
                .fields
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        UserProfile {
            uid: document.id.clone(),
            username: text("username"),
            email: text("email"),
            date_of_birth: document
                .fields
                .get("dateOfBirth")
                .and_then(Value::as_str)
                .and_then(|date| NaiveDate::parse_from_str(date, DATE_OF_BIRTH_FORMAT).ok()),
        }
    }
}

pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    policy: CallPolicy,
    users_collection: String,
    admins: AdminConfig,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        AccountService {
            auth,
            store,
            policy: CallPolicy::default(),
            users_collection: "users".to_string(),
            admins: AdminConfig::default(),
        }
    }

    pub fn from_config(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        config: &AppConfig,
    ) -> Self {
        AccountService {
            auth,
            store,
            policy: CallPolicy::from_config(&config.directory),
            users_collection: config.directory.users_collection.clone(),
            admins: config.admin.clone(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create an account, sign it in, and write its profile document
    pub async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        registration.validate()?;

        let user = self
            .policy
            .write(
                "sign up",
                self.auth
                    .sign_up(&registration.email, &registration.password),
            )
            .await
            .map_err(auth_failure)?;
        self.store.authorize(Some(user.id_token.clone()));

        let profile = UserProfile {
            uid: user.uid.clone(),
            username: registration.username.clone(),
            email: registration.email.clone(),
            date_of_birth: registration.date_of_birth,
        };
        self.policy
            .write(
                "save profile",
                self.store
                    .set(&self.users_collection, &user.uid, profile.to_fields()),
            )
            .await
            .map_err(store_failure)?;

        info!("Registered {}", user.email);
        Ok(self.session_for(user))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "All fields are required.".to_string(),
            ));
        }

        let user = self
            .policy
            .write("sign in", self.auth.sign_in(email, password))
            .await
            .map_err(auth_failure)?;
        self.store.authorize(Some(user.id_token.clone()));

        let session = self.session_for(user);
        info!("Signed in {} as {:?}", session.user.email, session.role);
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await?;
        self.store.authorize(None);
        Ok(())
    }

    pub async fn delete_account(&self) -> Result<(), AuthError> {
        self.policy
            .write("delete account", self.auth.delete_account())
            .await
            .map_err(auth_failure)?;
        self.store.authorize(None);
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.auth.current_user().map(|user| self.session_for(user))
    }

    /// Profile of the signed-in user
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        let user = self.auth.current_user().ok_or(AuthError::NotSignedIn)?;
        let document = self
            .policy
            .read("load profile", || {
                self.store.get(&self.users_collection, &user.uid)
            })
            .await
            .map_err(store_failure)?;
        Ok(UserProfile::from_document(&document))
    }

    pub async fn update_profile(
        &self,
        username: &str,
        email: &str,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<UserProfile, AuthError> {
        let user = self.auth.current_user().ok_or(AuthError::NotSignedIn)?;
        let profile = UserProfile {
            uid: user.uid.clone(),
            username: username.to_string(),
            email: email.to_string(),
            date_of_birth,
        };
        self.policy
            .write(
                "update profile",
                self.store
                    .update(&self.users_collection, &user.uid, profile.to_fields()),
            )
            .await
            .map_err(store_failure)?;
        Ok(profile)
    }

    fn session_for(&self, user: AuthUser) -> Session {
        let role = if self.admins.is_admin(&user.email) {
            Role::Admin
        } else {
            Role::Member
        };
        Session { user, role }
    }
}

fn auth_failure(failure: CallFailure<AuthError>) -> AuthError {
    match failure {
        CallFailure::Timeout(limit) => AuthError::Timeout(limit),
        CallFailure::Failed(e) => e,
    }
}

fn store_failure(failure: CallFailure<StoreError>) -> AuthError {
    match failure {
        CallFailure::Timeout(limit) => AuthError::Timeout(limit),
        CallFailure::Failed(e) => AuthError::Store(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryAuth;
    use crate::store::InMemoryStore;

    fn service(auth: InMemoryAuth) -> (Arc<InMemoryStore>, AccountService) {
        let store = Arc::new(InMemoryStore::new());
        let service = AccountService::new(Arc::new(auth), store.clone());
        (store, service)
    }

    fn registration() -> Registration {
        Registration {
            username: "faruk".to_string(),
            email: "faruk@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1999, 4, 2),
        }
    }

    #[tokio::test]
    async fn test_register_writes_profile() {
        let (store, service) = service(InMemoryAuth::new());
        let session = service.register(&registration()).await.unwrap();

        assert_eq!(session.role, Role::Member);
        let fields = store.document("users", &session.user.uid).unwrap();
        assert_eq!(fields["username"], "faruk");
        assert_eq!(fields["dateOfBirth"], "1999-04-02");
        assert_eq!(fields["uid"], session.user.uid.as_str());
    }

    #[tokio::test]
    async fn test_register_requires_all_fields() {
        let (store, service) = service(InMemoryAuth::new());
        let mut form = registration();
        form.username.clear();

        let result = service.register(&form).await;
        assert!(matches!(result, Err(AuthError::Validation(m)) if m == "All fields are required."));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords() {
        let (store, service) = service(InMemoryAuth::new());
        let mut form = registration();
        form.confirm_password = "secret2".to_string();

        assert!(matches!(
            service.register(&form).await,
            Err(AuthError::PasswordMismatch)
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_role_from_email() {
        let auth = InMemoryAuth::new()
            .with_account("admin@gmail.com", "adminpass")
            .with_account("cook@example.com", "cookpass");
        let (_, service) = service(auth);

        let admin = service.sign_in("admin@gmail.com", "adminpass").await.unwrap();
        assert!(admin.is_admin());
        assert!(admin.require_admin().is_ok());

        let cook = service.sign_in("cook@example.com", "cookpass").await.unwrap();
        assert_eq!(cook.role, Role::Member);
        assert!(matches!(cook.require_admin(), Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn test_sign_in_passes_remote_message_through() {
        let auth = InMemoryAuth::new().with_account("cook@example.com", "cookpass");
        let (_, service) = service(auth);

        let result = service.sign_in("cook@example.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::Remote(m)) if m == "INVALID_PASSWORD"));
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let (_, service) = service(InMemoryAuth::new());
        service.register(&registration()).await.unwrap();

        let updated = service
            .update_profile("faruk_r", "faruk@example.com", None)
            .await
            .unwrap();
        let loaded = service.profile().await.unwrap();
        assert_eq!(loaded, updated);
        assert_eq!(loaded.username, "faruk_r");
        assert!(loaded.date_of_birth.is_none());
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let (_, service) = service(InMemoryAuth::new());
        assert!(matches!(
            service.profile().await,
            Err(AuthError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_and_delete() {
        let (_, service) = service(InMemoryAuth::new());
        service.register(&registration()).await.unwrap();
        assert!(service.current_session().is_some());

        service.delete_account().await.unwrap();
        assert!(service.current_session().is_none());
        assert!(matches!(
            service.sign_in("faruk@example.com", "secret1").await,
            Err(AuthError::Remote(_))
        ));

        service.sign_out().await.unwrap();
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_requires_both_fields() {
        let (store, service) = service(InMemoryAuth::new());

        let result = service.sign_in("cook@example.com", "").await;
        assert!(matches!(result, Err(AuthError::Validation(m)) if m == "All fields are required."));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_list_comes_from_config() {
        let mut config = AppConfig::default();
        config.admin.emails = vec!["Moderator@Example.com".to_string()];
        let auth = InMemoryAuth::new()
            .with_account("moderator@example.com", "modpass")
            .with_account("admin@gmail.com", "adminpass");
        let service = AccountService::from_config(
            Arc::new(auth),
            Arc::new(InMemoryStore::new()),
            &config,
        );

        let moderator = service
            .sign_in("moderator@example.com", "modpass")
            .await
            .unwrap();
        assert!(moderator.is_admin());

        let former = service.sign_in("admin@gmail.com", "adminpass").await.unwrap();
        assert_eq!(former.role, Role::Member);
    }
}
