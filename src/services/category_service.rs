use crate::database::DbPool;
use crate::entities::{category_entity as categories, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

const CATEGORY_IN_USE: &str = "Category is still used by products";

#[derive(Clone)]
pub struct CategoryService {
    pool: DbPool,
}

impl CategoryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryResponse>> {
        let rows = categories::Entity::find()
            .order_by_desc(categories::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(CategoryResponse::from).collect())
    }

    pub async fn get_category(&self, id: i64) -> AppResult<CategoryResponse> {
        self.find(id).await.map(CategoryResponse::from)
    }

    pub async fn create_category(&self, request: CategoryRequest) -> AppResult<CategoryResponse> {
        let nama_kategori = request.validated_name()?;
        let created = categories::ActiveModel {
            nama_kategori: Set(nama_kategori),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;
        Ok(CategoryResponse::from(created))
    }

    pub async fn update_category(
        &self,
        id: i64,
        request: CategoryRequest,
    ) -> AppResult<CategoryResponse> {
        let nama_kategori = request.validated_name()?;
        let mut model = self.find(id).await?.into_active_model();
        model.nama_kategori = Set(nama_kategori);
        let updated = model.update(self.pool.as_ref()).await?;
        Ok(CategoryResponse::from(updated))
    }

    /// Refused while any product still references the category.
    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        self.find(id).await?;

        let in_use = products::Entity::find()
            .filter(products::Column::KategoriId.eq(id))
            .one(self.pool.as_ref())
            .await?
            .is_some();
        if in_use {
            log::warn!("Refusing to delete category {id}: still used by products");
            return Err(AppError::ValidationError(CATEGORY_IN_USE.to_string()));
        }

        // A product may have been added since the check; the FK refuses it.
        categories::Entity::delete_by_id(id)
            .exec(self.pool.as_ref())
            .await
            .map_err(|e| AppError::foreign_key_violation_or(e, CATEGORY_IN_USE))?;
        Ok(())
    }

    async fn find(&self, id: i64) -> AppResult<categories::Model> {
        categories::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::statement_log;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn category(id: i64) -> categories::Model {
        categories::Model {
            id,
            nama_kategori: "Minuman".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
        }
    }

    fn product(id: i64, kategori_id: i64) -> products::Model {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        products::Model {
            id,
            nama_produk: "Es Teh".to_string(),
            harga: 5000,
            stok: 10,
            kategori_id: Some(kategori_id),
            image: None,
            deskripsi: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_delete_category_in_use_is_refused() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![category(1)]])
                .append_query_results([vec![product(5, 1)]])
                .into_connection(),
        );
        let service = CategoryService::new(db);

        let err = service.delete_category(1).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("still used")));
    }

    #[tokio::test]
    async fn test_delete_unused_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![category(2)]])
                .append_query_results([Vec::<products::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = CategoryService::new(db.clone());

        service.delete_category(2).await.unwrap();
        drop(service);

        let log = statement_log(db);
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<categories::Model>::new()])
                .into_connection(),
        );
        let service = CategoryService::new(db);

        let err = service.delete_category(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_category_name_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = CategoryService::new(db);

        let err = service
            .create_category(CategoryRequest {
                nama_kategori: "   ".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
