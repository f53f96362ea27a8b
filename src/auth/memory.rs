use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::{AuthProvider, AuthUser};
use crate::error::AuthError;

#[derive(Default)]
struct State {
    /// email -> (uid, password)
    accounts: HashMap<String, (String, String)>,
    session: Option<AuthUser>,
    next_uid: usize,
}

/// Process-local `AuthProvider` for tests and offline demos.
///
/// Error messages mirror the hosted service's codes.
#[derive(Default)]
pub struct InMemoryAuth {
    state: Mutex<State>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account without signing it in
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.next_uid += 1;
            let uid = format!("uid-{}", state.next_uid);
            state
                .accounts
                .insert(email.to_string(), (uid, password.to_string()));
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn session_for(uid: &str, email: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: email.to_string(),
        id_token: format!("token-{}", uid),
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    fn provider_name(&self) -> &str {
        "memory"
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut state = self.lock();
        if state.accounts.contains_key(email) {
            return Err(AuthError::Remote("EMAIL_EXISTS".to_string()));
        }
        if password.len() < 6 {
            return Err(AuthError::Remote(
                "WEAK_PASSWORD : Password should be at least 6 characters".to_string(),
            ));
        }
        state.next_uid += 1;
        let uid = format!("uid-{}", state.next_uid);
        state
            .accounts
            .insert(email.to_string(), (uid.clone(), password.to_string()));
        let user = session_for(&uid, email);
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut state = self.lock();
        let user = match state.accounts.get(email) {
            Some((uid, stored)) if stored == password => session_for(uid, email),
            Some(_) => return Err(AuthError::Remote("INVALID_PASSWORD".to_string())),
            None => return Err(AuthError::Remote("EMAIL_NOT_FOUND".to_string())),
        };
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock().session = None;
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), AuthError> {
        let mut state = self.lock();
        let user = state.session.take().ok_or(AuthError::NotSignedIn)?;
        state.accounts.remove(&user.email);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.lock().session.clone()
    }
}
