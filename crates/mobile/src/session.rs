use std::sync::Arc;

use amply_api_types::auth::UpdateProfileRequest;
use amply_api_types::station::StationListQuery;
use amply_core::api::{ApiClient, ApiError, AuthService, TokenStore};
use amply_core::config::CoreConfig;
use amply_core::store::{AuthAction, AuthStore};
use amply_stations::StationIdentifier;

use crate::MobileError;
use crate::records::{AuthStateRecord, StationQueryRecord, StationRecord, UserRecord};
use crate::runtime::on_runtime;

/// Platform secure storage (Keystore / Keychain) for the access token.
#[uniffi::export(with_foreign)]
pub trait SecureStorage: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn set_token(&self, token: String);
    fn clear_token(&self);
}

struct ForeignTokens(Arc<dyn SecureStorage>);

impl TokenStore for ForeignTokens {
    fn load(&self) -> Option<String> {
        self.0.get_token().filter(|t| !t.is_empty())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        self.0.set_token(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        self.0.clear_token();
        Ok(())
    }
}

struct Inner {
    auth: AuthService,
    store: AuthStore,
}

/// Identity and station list access for the whole app.
#[derive(uniffi::Object)]
pub struct ApiSession {
    inner: Arc<Inner>,
}

#[uniffi::export]
impl ApiSession {
    #[uniffi::constructor]
    pub fn new(
        config_json: String,
        storage: Arc<dyn SecureStorage>,
    ) -> Result<Arc<Self>, MobileError> {
        let config = if config_json.trim().is_empty() {
            CoreConfig::from_env()?
        } else {
            CoreConfig::from_json(&config_json)?
        };

        let api = ApiClient::new(&config, Arc::new(ForeignTokens(storage)))?;
        let inner = Inner {
            auth: AuthService::new(api),
            store: AuthStore::new(),
        };
        Ok(Arc::new(Self {
            inner: Arc::new(inner),
        }))
    }

    pub fn auth_state(&self) -> AuthStateRecord {
        self.inner.store.state().into()
    }

    pub fn get_token(&self) -> Option<String> {
        self.inner.auth.get_token()
    }

    pub async fn login(
        &self,
        username_or_email: String,
        password: String,
    ) -> Result<UserRecord, MobileError> {
        let inner = self.inner.clone();
        let user = on_runtime(async move {
            inner
                .store
                .login(&inner.auth, &username_or_email, &password)
                .await
        })
        .await??;
        Ok(user.into())
    }

    /// Signs in with a token kept from an earlier launch, if there is one.
    pub async fn restore(&self) -> Result<Option<UserRecord>, MobileError> {
        let inner = self.inner.clone();
        let user = on_runtime(async move { inner.store.restore(&inner.auth).await }).await??;
        Ok(user.map(UserRecord::from))
    }

    pub async fn fetch_profile(&self) -> Result<UserRecord, MobileError> {
        let inner = self.inner.clone();
        let user = on_runtime(async move { inner.auth.fetch_profile().await }).await??;
        Ok(user.into())
    }

    /// Only the fields that are set are sent.
    pub async fn update_profile(
        &self,
        full_name: Option<String>,
        avatar: Option<String>,
    ) -> Result<UserRecord, MobileError> {
        let inner = self.inner.clone();
        let update = UpdateProfileRequest { full_name, avatar };
        let user = on_runtime(async move { inner.auth.update_profile(&update).await }).await??;
        self.inner.store.dispatch(AuthAction::SetUser(user.clone()));
        Ok(user.into())
    }

    pub fn logout(&self) -> Result<(), MobileError> {
        Ok(self.inner.store.logout(&self.inner.auth)?)
    }

    pub async fn list_stations(
        &self,
        query: StationQueryRecord,
    ) -> Result<Vec<StationRecord>, MobileError> {
        let inner = self.inner.clone();
        let query = StationListQuery::from(query);
        let stations =
            on_runtime(async move { inner.auth.api().list_stations(&query).await }).await??;
        Ok(stations.iter().map(StationRecord::from).collect())
    }

    pub async fn get_station(&self, id: String) -> Result<StationRecord, MobileError> {
        let inner = self.inner.clone();
        let id = StationIdentifier::new(id);
        let station = on_runtime(async move { inner.auth.api().get_station(&id).await }).await??;
        Ok(StationRecord::from(&station))
    }
}
