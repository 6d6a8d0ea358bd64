pub mod auth;
pub mod category;
pub mod product;
pub mod report;
pub mod transaction;
pub mod user;

pub use auth::auth_config;
pub use category::category_config;
pub use product::product_config;
pub use report::report_config;
pub use transaction::transaction_config;
pub use user::user_config;

use actix_web::web;

use crate::error::AppError;

/// Every `/api` route, plus extractor error handlers that turn malformed
/// JSON bodies, paths and query strings into 400 validation errors.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid path parameter: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query string: {err}")).into()
    }))
    .configure(auth_config)
    .configure(user_config)
    .configure(category_config)
    .configure(product_config)
    .configure(transaction_config)
    .configure(report_config);
}
