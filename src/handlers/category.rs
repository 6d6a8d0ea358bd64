use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::entities::Role;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::CategoryService;

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Categories, newest first", body = [CategoryResponse]))
)]
pub async fn list_categories(
    category_service: web::Data<CategoryService>,
    _user: AuthUser,
) -> Result<HttpResponse> {
    match category_service.list_categories().await {
        Ok(categories) => Ok(HttpResponse::Ok().json(ApiResponse::success(categories))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "No such category", body = ApiError)
    )
)]
pub async fn get_category(
    category_service: web::Data<CategoryService>,
    _user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match category_service.get_category(path.into_inner()).await {
        Ok(category) => Ok(HttpResponse::Ok().json(ApiResponse::success(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn create_category(
    category_service: web::Data<CategoryService>,
    user: AuthUser,
    request: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match category_service.create_category(request.into_inner()).await {
        Ok(category) => Ok(HttpResponse::Created().json(ApiResponse::success(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 404, description = "No such category", body = ApiError)
    )
)]
pub async fn update_category(
    category_service: web::Data<CategoryService>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match category_service
        .update_category(path.into_inner(), request.into_inner())
        .await
    {
        Ok(category) => Ok(HttpResponse::Ok().json(ApiResponse::success(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category still used by products", body = ApiError),
        (status = 404, description = "No such category", body = ApiError)
    )
)]
pub async fn delete_category(
    category_service: web::Data<CategoryService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match category_service.delete_category(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Category deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn category_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::get().to(get_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::delete().to(delete_category)),
    );
}
