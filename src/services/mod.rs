pub mod auth_service;
pub mod category_service;
pub mod image_store;
pub mod product_service;
pub mod report_service;
pub mod token_store;
pub mod transaction_service;
pub mod user_service;

pub use auth_service::*;
pub use category_service::*;
pub use image_store::*;
pub use product_service::*;
pub use report_service::*;
pub use token_store::*;
pub use transaction_service::*;
pub use user_service::*;
