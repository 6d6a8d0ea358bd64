use crate::entities::category_entity;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Minuman")]
    pub nama_kategori: String,
}

impl CategoryRequest {
    /// Returns the trimmed name.
    pub fn validated_name(&self) -> AppResult<String> {
        let name = self.nama_kategori.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::ValidationError(
                "nama_kategori must be between 1 and 100 characters".to_string(),
            ));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub nama_kategori: String,
    pub created_at: DateTime<Utc>,
}

impl From<category_entity::Model> for CategoryResponse {
    fn from(m: category_entity::Model) -> Self {
        Self {
            id: m.id,
            nama_kategori: m.nama_kategori,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_name() {
        let ok = CategoryRequest {
            nama_kategori: "  Makanan ".into(),
        };
        assert_eq!(ok.validated_name().unwrap(), "Makanan");

        let blank = CategoryRequest {
            nama_kategori: "   ".into(),
        };
        assert!(blank.validated_name().is_err());
    }
}
