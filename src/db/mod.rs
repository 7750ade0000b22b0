pub mod categories;
pub mod password_recover_tokens;
pub mod products;
pub mod roles;
pub mod users;
