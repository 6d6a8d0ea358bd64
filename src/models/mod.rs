pub mod auth;
pub mod category;
pub mod checkout;
pub mod common;
pub mod product;
pub mod report;
pub mod transaction;
pub mod user;

pub use auth::*;
pub use category::*;
pub use checkout::*;
pub use common::*;
pub use product::*;
pub use report::*;
pub use transaction::*;
pub use user::*;
