use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::Role;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::user::me,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::category::list_categories,
        handlers::category::get_category,
        handlers::category::create_category,
        handlers::category::update_category,
        handlers::category::delete_category,
        handlers::product::list_products,
        handlers::product::get_product,
        handlers::product::create_product,
        handlers::product::update_product,
        handlers::product::delete_product,
        handlers::product::upload_image,
        handlers::transaction::list_transactions,
        handlers::transaction::get_transaction,
        handlers::transaction::get_by_code,
        handlers::transaction::create_transaction,
        handlers::transaction::update_transaction,
        handlers::transaction::delete_transaction,
        handlers::report::sales_report,
    ),
    components(
        schemas(
            Role,
            ApiError,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            RefreshResponse,
            UserResponse,
            CreateUserRequest,
            UpdateUserRequest,
            CategoryRequest,
            CategoryResponse,
            ProductQuery,
            ProductRequest,
            ProductResponse,
            ImageUpload,
            CheckoutRequest,
            CheckoutItemRequest,
            TransactionResponse,
            TransactionItemResponse,
            TransactionDetailResponse,
            SalesReport,
            BestSeller,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-up, login and token refresh"),
        (name = "users", description = "Account administration"),
        (name = "categories", description = "Product categories"),
        (name = "products", description = "Product catalog"),
        (name = "transactions", description = "Sales and checkout"),
        (name = "reports", description = "Sales reporting"),
    ),
    info(
        title = "POS Backend API",
        version = "1.0.0",
        description = "Point-of-sale REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_checkout_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["paths"]["/api/transactions"]["post"].is_object());
        assert!(json["paths"]["/api/products/{id}/image"]["post"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
