use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserResponse;

/// Public sign-up. There is deliberately no `role` field: self-registered
/// accounts are always customers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Pelanggan Baru")]
    pub nama: String,
    #[schema(example = "pelanggan@mail.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "kasir@mail.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Body of `/auth/refresh` and `/auth/logout`.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshTokenRequest {
    pub fn token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_ignores_role() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"nama":"Mallory","email":"m@mail.com","password":"secret1","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(req.nama, "Mallory");
    }

    #[test]
    fn test_refresh_token_request_token() {
        let req: RefreshTokenRequest = serde_json::from_str(r#"{"refreshToken":" abc "}"#).unwrap();
        assert_eq!(req.token(), Some("abc"));

        let empty: RefreshTokenRequest = serde_json::from_str(r#"{"refreshToken":""}"#).unwrap();
        assert_eq!(empty.token(), None);

        let missing: RefreshTokenRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.token(), None);
    }
}
