//! Application-wide authentication state.

use amply_api_types::auth::User;
use tokio::sync::watch;
use tracing::warn;

use crate::api::{ApiError, AuthService};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_authenticated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthAction {
    SetLoading(bool),
    SetError(Option<String>),
    SetUser(User),
    Logout,
}

impl AuthState {
    pub fn apply(&mut self, action: AuthAction) {
        match action {
            AuthAction::SetLoading(loading) => self.is_loading = loading,
            AuthAction::SetError(error) => self.error = error,
            AuthAction::SetUser(user) => {
                self.user = Some(user);
                self.is_loading = false;
                self.error = None;
                self.is_authenticated = true;
            }
            AuthAction::Logout => *self = Self::default(),
        }
    }
}

pub struct AuthStore {
    state: watch::Sender<AuthState>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(AuthState::default()),
        }
    }

    pub fn dispatch(&self, action: AuthAction) {
        self.state.send_modify(|state| state.apply(action));
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub async fn login(
        &self,
        auth: &AuthService,
        username_or_email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        self.dispatch(AuthAction::SetError(None));
        self.dispatch(AuthAction::SetLoading(true));

        match auth.login(username_or_email, password).await {
            Ok((_, user)) => {
                self.dispatch(AuthAction::SetUser(user.clone()));
                Ok(user)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Picks up a token stored by an earlier launch. An expired one is dropped.
    pub async fn restore(&self, auth: &AuthService) -> Result<Option<User>, ApiError> {
        if auth.get_token().is_none() {
            return Ok(None);
        }

        self.dispatch(AuthAction::SetLoading(true));
        match auth.fetch_profile().await {
            Ok(user) => {
                self.dispatch(AuthAction::SetUser(user.clone()));
                Ok(Some(user))
            }
            Err(ApiError::Unauthorized) => {
                warn!("stored token expired");
                self.logout(auth)?;
                Ok(None)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub fn logout(&self, auth: &AuthService) -> Result<(), ApiError> {
        let cleared = auth.logout();
        self.dispatch(AuthAction::Logout);
        cleared
    }

    fn fail(&self, err: &ApiError) {
        self.state.send_modify(|state| {
            state.apply(AuthAction::SetLoading(false));
            state.apply(AuthAction::SetError(Some(err.to_string())));
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::{ApiClient, MemoryTokenStore, TokenStore};

    fn user() -> User {
        User {
            id: 3,
            username: "lan".into(),
            email: "lan@amply.vn".into(),
            full_name: "Nguyen Lan".into(),
            avatar: "".into(),
            phone: None,
            role: "USER".into(),
        }
    }

    #[test]
    fn test_set_user_authenticates() {
        let mut state = AuthState {
            is_loading: true,
            error: Some("boom".into()),
            ..AuthState::default()
        };
        state.apply(AuthAction::SetUser(user()));

        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.user.unwrap().username, "lan");
    }

    #[test]
    fn test_logout_resets_everything() {
        let mut state = AuthState::default();
        state.apply(AuthAction::SetUser(user()));
        state.apply(AuthAction::SetLoading(true));
        state.apply(AuthAction::Logout);

        assert_eq!(state, AuthState::default());
    }

    #[tokio::test]
    async fn test_subscribers_see_actions() {
        let store = AuthStore::new();
        let mut rx = store.subscribe();

        store.dispatch(AuthAction::SetLoading(true));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading);

        store.dispatch(AuthAction::SetUser(user()));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated);
    }

    #[tokio::test]
    async fn test_restore_without_token_is_noop() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let api = ApiClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9/", tokens)
            .unwrap();
        let auth = AuthService::new(api);
        let store = AuthStore::new();

        assert!(store.restore(&auth).await.unwrap().is_none());
        assert_eq!(store.state(), AuthState::default());
    }

    #[test]
    fn test_logout_clears_store_and_token() {
        let tokens = Arc::new(MemoryTokenStore::new());
        tokens.save("t").unwrap();
        let api = ApiClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9/", tokens.clone())
            .unwrap();
        let auth = AuthService::new(api);
        let store = AuthStore::new();
        store.dispatch(AuthAction::SetUser(user()));

        store.logout(&auth).unwrap();
        assert!(!store.state().is_authenticated);
        assert!(tokens.load().is_none());
    }
}
