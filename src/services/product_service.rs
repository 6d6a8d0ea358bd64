use crate::database::DbPool;
use crate::entities::{category_entity as categories, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::ImageStore;
use actix_multipart::Multipart;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct ProductService {
    pool: DbPool,
    images: ImageStore,
}

impl ProductService {
    pub fn new(pool: DbPool, images: ImageStore) -> Self {
        Self { pool, images }
    }

    /// Newest first. `kategori` and `search` combine with AND.
    pub async fn list_products(&self, query: &ProductQuery) -> AppResult<Vec<ProductResponse>> {
        let mut select = products::Entity::find().find_also_related(categories::Entity);

        if let Some(kategori_id) = query.kategori {
            select = select.filter(products::Column::KategoriId.eq(kategori_id));
        }
        match query.search_term() {
            Some(ProductSearch::ById(id)) => {
                select = select.filter(products::Column::Id.eq(id));
            }
            Some(ProductSearch::ByName(term)) => {
                let lowered =
                    Expr::expr(Func::lower(Expr::col((products::Entity, products::Column::NamaProduk))));
                select = select.filter(lowered.like(name_pattern(&term)));
            }
            None => {}
        }

        let rows = select
            .order_by_desc(products::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(product, category)| ProductResponse::with_category(product, category))
            .collect())
    }

    pub async fn get_product(&self, id: i64) -> AppResult<ProductResponse> {
        let (product, category) = products::Entity::find_by_id(id)
            .find_also_related(categories::Entity)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(product_not_found)?;
        Ok(ProductResponse::with_category(product, category))
    }

    pub async fn create_product(&self, request: ProductRequest) -> AppResult<ProductResponse> {
        request.validate()?;
        let category = self.category_for(request.kategori_id).await?;

        let now = Utc::now();
        let created = products::ActiveModel {
            nama_produk: Set(request.nama_produk.trim().to_string()),
            harga: Set(request.harga),
            stok: Set(request.stok),
            kategori_id: Set(request.kategori_id),
            image: Set(None),
            deskripsi: Set(request.deskripsi),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        Ok(ProductResponse::with_category(created, category))
    }

    pub async fn update_product(
        &self,
        id: i64,
        request: ProductRequest,
    ) -> AppResult<ProductResponse> {
        request.validate()?;
        let mut model = self.find(id).await?.into_active_model();
        let category = self.category_for(request.kategori_id).await?;

        model.nama_produk = Set(request.nama_produk.trim().to_string());
        model.harga = Set(request.harga);
        model.stok = Set(request.stok);
        model.kategori_id = Set(request.kategori_id);
        model.deskripsi = Set(request.deskripsi);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.pool.as_ref()).await?;

        Ok(ProductResponse::with_category(updated, category))
    }

    /// Line items that referenced the product keep their rows with a NULL
    /// product.
    pub async fn delete_product(&self, id: i64) -> AppResult<()> {
        let product = self.find(id).await?;
        products::Entity::delete_by_id(id).exec(self.pool.as_ref()).await?;
        if let Some(image) = product.image {
            self.images.remove(&image).await;
        }
        Ok(())
    }

    /// Stores the uploaded image and replaces the product's previous one.
    pub async fn replace_image(&self, id: i64, payload: Multipart) -> AppResult<ProductResponse> {
        let product = self.find(id).await?;
        let public_path = self.images.save_product_image(payload).await?;

        let previous = product.image.clone();
        let mut model = product.into_active_model();
        model.image = Set(Some(public_path.clone()));
        model.updated_at = Set(Utc::now());
        let updated = match model.update(self.pool.as_ref()).await {
            Ok(updated) => updated,
            Err(e) => {
                self.images.remove(&public_path).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous {
            self.images.remove(&previous).await;
        }

        let category = self.category_for(updated.kategori_id).await?;
        Ok(ProductResponse::with_category(updated, category))
    }

    async fn find(&self, id: i64) -> AppResult<products::Model> {
        products::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(product_not_found)
    }

    async fn category_for(&self, kategori_id: Option<i64>) -> AppResult<Option<categories::Model>> {
        let Some(kategori_id) = kategori_id else {
            return Ok(None);
        };
        categories::Entity::find_by_id(kategori_id)
            .one(self.pool.as_ref())
            .await?
            .map(Some)
            .ok_or_else(|| AppError::ValidationError("Category not found".to_string()))
    }
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: DbPool) -> ProductService {
        ProductService::new(db, ImageStore::new(&UploadConfig::default()))
    }

    fn request(kategori_id: Option<i64>) -> ProductRequest {
        ProductRequest {
            nama_produk: " Kopi Susu ".into(),
            harga: 18_000,
            stok: 20,
            kategori_id,
            deskripsi: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_unknown_category_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<categories::Model>::new()])
                .into_connection(),
        );

        let err = service(db).create_product(request(Some(9))).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Category not found"));
    }

    #[tokio::test]
    async fn test_create_trims_name() {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let stored = products::Model {
            id: 1,
            nama_produk: "Kopi Susu".into(),
            harga: 18_000,
            stok: 20,
            kategori_id: None,
            image: None,
            deskripsi: None,
            created_at: at,
            updated_at: at,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![stored]])
                .into_connection(),
        );

        let created = service(db).create_product(request(None)).await.unwrap();
        assert_eq!(created.nama_produk, "Kopi Susu");
        assert!(created.nama_kategori.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<products::Model>::new()])
                .into_connection(),
        );

        let err = service(db).update_product(3, request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
