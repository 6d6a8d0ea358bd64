use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::entities::Role;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::TransactionService;

#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Newest first; customers only get their own", body = [TransactionResponse]))
)]
pub async fn list_transactions(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    match transaction_service.list_transactions(&user).await {
        Ok(transactions) => Ok(HttpResponse::Ok().json(ApiResponse::success(transactions))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i64, Path, description = "Transaction id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction with items", body = TransactionDetailResponse),
        (status = 400, description = "Id is not a number", body = ApiError),
        (status = 403, description = "Another customer's transaction", body = ApiError),
        (status = 404, description = "No such transaction", body = ApiError)
    )
)]
pub async fn get_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match transaction_service
        .get_transaction(path.into_inner(), &user)
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/transactions/kode/{kode}",
    tag = "transactions",
    params(("kode" = String, Path, description = "Transaction code, e.g. TRX-20251101-0042")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction with items", body = TransactionDetailResponse),
        (status = 404, description = "No such transaction", body = ApiError)
    )
)]
pub async fn get_by_code(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin, Role::Kasir])?;
    match transaction_service.get_by_code(&path).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "transactions",
    request_body = CheckoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Sale recorded", body = TransactionDetailResponse),
        (status = 400, description = "Checkout rejected", body = ApiError),
        (status = 409, description = "No free transaction code", body = ApiError)
    )
)]
pub async fn create_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    match transaction_service
        .create_transaction(&user, request.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            detail,
            "Transaction recorded",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i64, Path, description = "Transaction id")),
    request_body = CheckoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction re-priced", body = TransactionDetailResponse),
        (status = 400, description = "Checkout rejected", body = ApiError),
        (status = 404, description = "No such transaction", body = ApiError)
    )
)]
pub async fn update_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin, Role::Kasir])?;
    match transaction_service
        .update_transaction(path.into_inner(), &user, request.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i64, Path, description = "Transaction id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction deleted"),
        (status = 404, description = "No such transaction", body = ApiError)
    )
)]
pub async fn delete_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin, Role::Kasir])?;
    match transaction_service.delete_transaction(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Transaction deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::get().to(list_transactions))
            .route("", web::post().to(create_transaction))
            .route("/kode/{kode}", web::get().to(get_by_code))
            .route("/{id}", web::get().to(get_transaction))
            .route("/{id}", web::put().to(update_transaction))
            .route("/{id}", web::delete().to(delete_transaction)),
    );
}
