use super::handlers::{admin, health, me, user_login, user_register, users};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Routes added outside (like
/// `/` and the Swagger UI) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut users_tag = Tag::new("users");
    users_tag.description = Some("Registration, login and self-service profile".to_string());

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Admin panel: user management endpoints".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service health".to_string());

    let mut base = cargo_openapi();
    base.tags = Some(vec![users_tag, admin_tag, health_tag]);

    // `routes!` reads #[utoipa::path] to bind HTTP method + path; handlers
    // that share a path must be registered in the same call.
    let router = OpenApiRouter::with_openapi(base)
        .routes(routes!(health::health))
        .routes(routes!(user_register::register))
        .routes(routes!(user_login::login))
        .routes(routes!(me::me))
        .routes(routes!(users::update_user, users::delete_user))
        .routes(routes!(admin::dashboard))
        .routes(routes!(admin::login))
        .routes(routes!(admin::me))
        .routes(routes!(admin::create_user, admin::list_users))
        .routes(routes!(
            admin::get_user,
            admin::update_user,
            admin::delete_user
        ))
        .routes(routes!(admin::create_admin));

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "users"));
        assert!(tags.iter().any(|tag| tag.name == "admin"));

        for path in [
            "/health",
            "/users",
            "/login",
            "/me",
            "/users/{user_id}",
            "/admin",
            "/admin/login",
            "/admin/me",
            "/admin/users",
            "/admin/users/{user_id}",
            "/admin/admins",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path: {path}");
        }
    }
}
