use actix_multipart::Multipart;
use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::entities::Role;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::ProductService;

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ProductQuery),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Matching products, newest first", body = [ProductResponse]))
)]
pub async fn list_products(
    product_service: web::Data<ProductService>,
    _user: AuthUser,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse> {
    match product_service.list_products(&query).await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "No such product", body = ApiError)
    )
)]
pub async fn get_product(
    product_service: web::Data<ProductService>,
    _user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match product_service.get_product(path.into_inner()).await {
        Ok(product) => Ok(HttpResponse::Ok().json(ApiResponse::success(product))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = ProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid body or unknown category", body = ApiError)
    )
)]
pub async fn create_product(
    product_service: web::Data<ProductService>,
    user: AuthUser,
    request: web::Json<ProductRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match product_service.create_product(request.into_inner()).await {
        Ok(product) => Ok(HttpResponse::Created().json(ApiResponse::success(product))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "No such product", body = ApiError)
    )
)]
pub async fn update_product(
    product_service: web::Data<ProductService>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<ProductRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match product_service
        .update_product(path.into_inner(), request.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Ok().json(ApiResponse::success(product))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "No such product", body = ApiError)
    )
)]
pub async fn delete_product(
    product_service: web::Data<ProductService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match product_service.delete_product(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Product deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Multipart upload; the file goes in the `image` field.
#[utoipa::path(
    post,
    path = "/api/products/{id}/image",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    request_body(content = ImageUpload, content_type = "multipart/form-data", description = "Field `image`: .jpg, .jpeg, .png or .gif"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Image stored", body = ProductResponse),
        (status = 400, description = "Missing field, bad type or too large", body = ApiError),
        (status = 404, description = "No such product", body = ApiError)
    )
)]
pub async fn upload_image(
    product_service: web::Data<ProductService>,
    user: AuthUser,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match product_service
        .replace_image(path.into_inner(), payload)
        .await
    {
        Ok(product) => Ok(HttpResponse::Ok().json(ApiResponse::success(product))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn product_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::get().to(list_products))
            .route("", web::post().to(create_product))
            .route("/{id}", web::get().to(get_product))
            .route("/{id}", web::put().to(update_product))
            .route("/{id}", web::delete().to(delete_product))
            .route("/{id}/image", web::post().to(upload_image)),
    );
}
