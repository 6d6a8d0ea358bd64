use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::entities::Role;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::UserService;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiError)
    )
)]
pub async fn me(user_service: web::Data<UserService>, user: AuthUser) -> Result<HttpResponse> {
    match user_service.get_user(user.id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts, newest first", body = [UserResponse]),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match user_service.list_users().await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(users))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 404, description = "No such user", body = ApiError)
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match user_service.get_user(path.into_inner()).await {
        Ok(found) => Ok(HttpResponse::Ok().json(ApiResponse::success(found))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid body or email already in use", body = ApiError)
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    user: AuthUser,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match user_service.create_user(request.into_inner()).await {
        Ok(created) => Ok(HttpResponse::Created().json(ApiResponse::success(created))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 404, description = "No such user", body = ApiError)
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match user_service
        .update_user(path.into_inner(), request.into_inner())
        .await
    {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(updated))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 404, description = "No such user", body = ApiError)
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match user_service.delete_user(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("User deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/me", web::get().to(me))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
