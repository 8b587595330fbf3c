use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the credential exchange at POST /auth/token.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Response returned from POST /auth/token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// User profile exposed to clients. Never carries password material.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub notifications_enabled: bool,
}

/// Request body for PATCH /users/me. Every change requires the current
/// password as confirmation.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub current_password: String,
    pub new_password: Option<String>,
    pub email: Option<String>,
    pub notifications_enabled: Option<bool>,
}

/// Request body for DELETE /users/me.
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_has_no_password_fields() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            notifications_enabled: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("user@example.com"));
        assert!(json.contains("notifications_enabled"));
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
    }

    #[test]
    fn token_response_shape() {
        let response = TokenResponse {
            access_token: "abc.def.ghi".into(),
            token_type: "bearer",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"access_token\":\"abc.def.ghi\""));
        assert!(json.contains("\"token_type\":\"bearer\""));
    }

    #[test]
    fn update_request_fields_are_optional() {
        let parsed: UpdateUserRequest =
            serde_json::from_str(r#"{"current_password":"SecurePass123!"}"#).unwrap();
        assert!(parsed.new_password.is_none());
        assert!(parsed.email.is_none());
        assert!(parsed.notifications_enabled.is_none());
    }
}
