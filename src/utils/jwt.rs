use crate::entities::Role;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: Role,
    pub nama: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// A signed token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn issue(
        &self,
        user_id: i64,
        role: Role,
        nama: &str,
        token_type: &str,
        expires_in: i64,
    ) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            nama: nama.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn generate_access_token(&self, user_id: i64, role: Role, nama: &str) -> AppResult<String> {
        self.issue(user_id, role, nama, ACCESS_TOKEN, self.access_token_expires_in)
            .map(|t| t.token)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        role: Role,
        nama: &str,
    ) -> AppResult<IssuedToken> {
        self.issue(user_id, role, nama, REFRESH_TOKEN, self.refresh_token_expires_in)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != ACCESS_TOKEN {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != REFRESH_TOKEN {
            return Err(AppError::AuthError("Invalid refresh token type".to_string()));
        }

        Ok(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", 3600, 7200)
    }

    #[test]
    fn test_access_token_round_trip_carries_role() {
        let jwt = service();
        let token = jwt.generate_access_token(42, Role::Kasir, "Budi").unwrap();
        let claims = jwt.verify_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.role, Role::Kasir);
        assert_eq!(claims.nama, "Budi");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = service();
        let access = jwt.generate_access_token(1, Role::Admin, "a").unwrap();
        let refresh = jwt.generate_refresh_token(1, Role::Admin, "a").unwrap();

        assert!(jwt.verify_refresh_token(&access).is_err());
        assert!(jwt.verify_access_token(&refresh.token).is_err());
        assert!(jwt.verify_refresh_token(&refresh.token).is_ok());
    }

    #[test]
    fn test_refresh_tokens_are_unique_within_a_second() {
        let jwt = service();
        let a = jwt.generate_refresh_token(1, Role::Pelanggan, "c").unwrap();
        let b = jwt.generate_refresh_token(1, Role::Pelanggan, "c").unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = JwtService::new("other-secret", 3600, 7200);
        let token = other.generate_access_token(1, Role::Admin, "x").unwrap();
        assert!(service().verify_access_token(&token).is_err());
    }
}
