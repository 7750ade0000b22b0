use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorBody, FieldMessage};
use crate::models::{Category, CategoryRef, ProductView, Role, UserView};
use crate::routes::{auth, categories, products, users};

/// OpenAPI document for the catalog API.
#[derive(OpenApi)]
#[openapi(
    info(title = "Catalog API", description = "Product catalog with categories, users and password recovery"),
    paths(
        auth::login,
        auth::create_recover_token,
        auth::save_new_password,
        categories::list,
        categories::get,
        categories::create,
        categories::update,
        categories::delete,
        products::list,
        products::get,
        products::create,
        products::update,
        products::delete,
        users::list,
        users::get,
        users::me,
        users::create,
        users::update,
        users::delete,
    ),
    components(schemas(
        Category,
        CategoryRef,
        ProductView,
        Role,
        UserView,
        ErrorBody,
        FieldMessage,
        auth::LoginRequest,
        auth::TokenResponse,
        auth::EmailRequest,
        auth::NewPasswordRequest,
        categories::CategoryRequest,
        products::ProductRequest,
        products::CategoryId,
        users::UserInsertRequest,
        users::UserUpdateRequest,
        users::RoleId,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and password recovery"),
        (name = "Categories", description = "Category management"),
        (name = "Products", description = "Product catalog and filtered listing"),
        (name = "Users", description = "User accounts and roles"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/auth/recover-token",
            "/auth/new-password",
            "/categories",
            "/categories/{id}",
            "/products",
            "/products/{id}",
            "/users",
            "/users/me",
            "/users/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} is undocumented");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ProductView"));
    }
}
