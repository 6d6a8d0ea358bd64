pub mod code_generator;
pub mod email;
pub mod jwt;
pub mod password;

pub use code_generator::{format_transaction_code, generate_transaction_code};
pub use email::*;
pub use jwt::*;
pub use password::*;
