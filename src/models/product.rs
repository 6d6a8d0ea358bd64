use crate::entities::{category_entity, product_entity};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Category id filter
    pub kategori: Option<i64>,
    /// Numeric values look up a product id, anything else matches the name
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSearch {
    ById(i64),
    ByName(String),
}

impl ProductQuery {
    pub fn search_term(&self) -> Option<ProductSearch> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        match term.parse::<i64>() {
            Ok(id) => Some(ProductSearch::ById(id)),
            Err(_) => Some(ProductSearch::ByName(term.to_string())),
        }
    }
}

/// Pattern for a case-insensitive substring match, compared against
/// `LOWER(nama_produk)`. LIKE wildcards in the input are escaped.
pub fn name_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRequest {
    #[schema(example = "Kopi Susu")]
    pub nama_produk: String,
    #[schema(example = 18000)]
    pub harga: i64,
    #[schema(example = 25)]
    pub stok: i32,
    #[schema(example = 1)]
    pub kategori_id: Option<i64>,
    pub deskripsi: Option<String>,
}

impl ProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let name = self.nama_produk.trim();
        if name.is_empty() || name.chars().count() > 255 {
            return Err(AppError::ValidationError(
                "nama_produk must be between 1 and 255 characters".to_string(),
            ));
        }
        if self.harga < 0 {
            return Err(AppError::ValidationError(
                "harga must not be negative".to_string(),
            ));
        }
        if self.stok < 0 {
            return Err(AppError::ValidationError(
                "stok must not be negative".to_string(),
            ));
        }
        if let Some(id) = self.kategori_id
            && id <= 0
        {
            return Err(AppError::ValidationError(
                "kategori_id is not valid".to_string(),
            ));
        }
        Ok(())
    }
}

/// Multipart body of the image upload endpoint.
#[derive(Debug, ToSchema)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub nama_produk: String,
    pub harga: i64,
    pub stok: i32,
    pub kategori_id: Option<i64>,
    pub nama_kategori: Option<String>,
    pub image: Option<String>,
    pub deskripsi: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn with_category(
        product: product_entity::Model,
        category: Option<category_entity::Model>,
    ) -> Self {
        Self {
            id: product.id,
            nama_produk: product.nama_produk,
            harga: product.harga,
            stok: product.stok,
            kategori_id: product.kategori_id,
            nama_kategori: category.map(|c| c.nama_kategori),
            image: product.image,
            deskripsi: product.deskripsi,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
