pub mod extractor;
pub mod jwt;
pub mod password;

pub const ROLE_OPERATOR: &str = "ROLE_OPERATOR";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
