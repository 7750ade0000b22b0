pub mod category;
pub mod password_recover_token;
pub mod product;
pub mod user;

pub use category::Category;
pub use password_recover_token::PasswordRecoverToken;
pub use product::{CategoryRef, Product, ProductCategoryRow, ProductProjection, ProductView, with_categories};
pub use user::{Role, User, UserRoleRow, UserView, with_roles};
