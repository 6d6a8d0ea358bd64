use crate::entities::{Role, user_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub nama: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            nama: user.nama,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Admin-side account creation; `role` defaults to `pelanggan`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Kasir Baru")]
    pub nama: String,
    #[schema(example = "kasirbaru@mail.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
    pub role: Option<Role>,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub nama: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.nama.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }

    /// Whether applying this update must end the user's existing sessions.
    pub fn revokes_sessions(&self) -> bool {
        self.password.is_some() || self.is_active == Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_flags() {
        assert!(UpdateUserRequest::default().is_empty());

        let deactivate = UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!deactivate.is_empty());
        assert!(deactivate.revokes_sessions());

        let rename = UpdateUserRequest {
            nama: Some("Siti".into()),
            ..Default::default()
        };
        assert!(!rename.revokes_sessions());
    }

    #[test]
    fn test_role_wire_format() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"nama":"K","email":"k@mail.com","password":"secret1","role":"kasir"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Some(Role::Kasir));
        assert!(
            serde_json::from_str::<CreateUserRequest>(
                r#"{"nama":"K","email":"k@mail.com","password":"x","role":"root"}"#
            )
            .is_err()
        );
    }
}
