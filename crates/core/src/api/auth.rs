use amply_api_types::auth::{LoginRequest, LoginResponse, UpdateProfileRequest, User};
use tracing::info;

use crate::api::{ApiClient, ApiError};

/// Identity calls. The booking core never depends on these.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Stores the access token, then loads the profile with it.
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<(String, User), ApiError> {
        let request = LoginRequest {
            username_or_email: username_or_email.to_owned(),
            password: password.to_owned(),
        };
        let LoginResponse { access_token } = self.api.post("auth/login", &request).await?;
        self.api.tokens().save(&access_token)?;

        let user = self.fetch_profile().await?;
        info!(user = %user.username, "logged in");
        Ok((access_token, user))
    }

    pub fn get_token(&self) -> Option<String> {
        self.api.tokens().load()
    }

    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        self.get_token().ok_or(ApiError::MissingToken)?;
        self.api.get("user/me", &[]).await
    }

    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<User, ApiError> {
        self.get_token().ok_or(ApiError::MissingToken)?;
        if update.is_empty() {
            return self.fetch_profile().await;
        }
        self.api.patch("user/update-profile", update).await
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.api.tokens().clear()
    }
}
