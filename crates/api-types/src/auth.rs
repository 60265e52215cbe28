use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: String,
}

/// `PATCH user/update-profile`; only the provided fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_field_names() {
        let body = serde_json::to_value(LoginRequest {
            username_or_email: "rider@amply.vn".into(),
            password: "hunter2".into(),
        })
        .unwrap();

        assert_eq!(body["usernameOrEmail"], "rider@amply.vn");
    }

    #[test]
    fn test_update_profile_sends_only_present_fields() {
        let body = serde_json::to_string(&UpdateProfileRequest {
            full_name: Some("Lan".into()),
            avatar: None,
        })
        .unwrap();

        assert_eq!(body, r#"{"fullName":"Lan"}"#);
        assert!(UpdateProfileRequest::default().is_empty());
    }

    #[test]
    fn test_user_tolerates_missing_optional_fields() {
        let user: User =
            serde_json::from_str(r#"{"id":3,"username":"lan","email":"lan@amply.vn"}"#).unwrap();
        assert_eq!(user.full_name, "");
        assert_eq!(user.phone, None);
    }
}
