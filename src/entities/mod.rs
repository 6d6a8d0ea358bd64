pub mod categories;
pub mod products;
pub mod refresh_tokens;
pub mod transaction_items;
pub mod transactions;
pub mod users;

pub use categories as category_entity;
pub use products as product_entity;
pub use refresh_tokens as refresh_token_entity;
pub use transaction_items as transaction_item_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use users::Role;
