//! Declarative route table bound against a named handler registry.
//!
//! Routes name their handler instead of referencing it, so a table can be
//! checked as a whole before the server starts: every route must resolve to a
//! registered handler and no (method, path) pair may appear twice.

use axum::Router;
use axum::routing::{MethodFilter, MethodRouter, on};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{DataApiError, Result};
use crate::modules::{data, health, user};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }
}

/// A (method, path) pair bound to a handler by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub handler: &'static str,
}

impl Route {
    pub const fn new(method: HttpMethod, path: &'static str, handler: &'static str) -> Self {
        Self {
            method,
            path,
            handler,
        }
    }
}

pub const ROUTES: &[Route] = &[
    Route::new(HttpMethod::Get, "/api/data", "getData"),
    Route::new(HttpMethod::Post, "/api/data", "postData"),
    Route::new(HttpMethod::Get, "/api/users", "listUsers"),
    Route::new(HttpMethod::Post, "/api/users", "createUser"),
    Route::new(HttpMethod::Patch, "/api/users", "updateUser"),
    Route::new(HttpMethod::Get, "/api/users/{id}", "getUser"),
    Route::new(HttpMethod::Delete, "/api/users/{id}", "deleteUser"),
    Route::new(HttpMethod::Get, "/health", "health"),
];

/// Builds the method router for a handler under the given method filter.
pub type HandlerFactory = fn(MethodFilter) -> MethodRouter<AppState>;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, HandlerFactory>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every handler the service exposes.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register("getData", |filter| on(filter, data::controller::get_data))
            .register("postData", |filter| on(filter, data::controller::post_data))
            .register("listUsers", |filter| on(filter, user::controller::list_users))
            .register("getUser", |filter| on(filter, user::controller::get_user))
            .register("createUser", |filter| {
                on(filter, user::controller::create_user)
            })
            .register("updateUser", |filter| {
                on(filter, user::controller::update_user)
            })
            .register("deleteUser", |filter| {
                on(filter, user::controller::delete_user)
            })
            .register("health", |filter| on(filter, health::health));
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: HandlerFactory) -> &mut Self {
        self.handlers.insert(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<HandlerFactory> {
        self.handlers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// Checks the table against the registry without building anything.
pub fn validate(routes: &[Route], registry: &HandlerRegistry) -> Result<()> {
    let mut seen = HashSet::new();
    for route in routes {
        if !seen.insert((route.method, route.path)) {
            return Err(DataApiError::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path.to_string(),
            });
        }
        if !registry.contains(route.handler) {
            return Err(DataApiError::UnboundHandler {
                method: route.method.to_string(),
                path: route.path.to_string(),
                handler: route.handler.to_string(),
            });
        }
    }
    Ok(())
}

/// Validates the table, then mounts every route.
pub fn bind_routes(routes: &[Route], registry: &HandlerRegistry) -> Result<Router<AppState>> {
    validate(routes, registry)?;

    let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for route in routes {
        let Some(factory) = registry.get(route.handler) else {
            continue;
        };
        let method_router = factory(route.method.filter());
        let merged = match by_path.remove(route.path) {
            Some(existing) => existing.merge(method_router),
            None => method_router,
        };
        by_path.insert(route.path, merged);

        tracing::debug!(
            method = %route.method,
            path = route.path,
            handler = route.handler,
            "Route bound"
        );
    }

    Ok(by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_fully_bound() {
        validate(ROUTES, &HandlerRegistry::standard()).unwrap();
    }

    #[test]
    fn test_unknown_handler_fails_at_startup() {
        let routes = [
            Route::new(HttpMethod::Get, "/api/data", "getData"),
            Route::new(HttpMethod::Post, "/api/data", "createData"),
        ];

        let err = bind_routes(&routes, &HandlerRegistry::standard()).err().unwrap();
        match err {
            DataApiError::UnboundHandler {
                method,
                path,
                handler,
            } => {
                assert_eq!(method, "POST");
                assert_eq!(path, "/api/data");
                assert_eq!(handler, "createData");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let routes = [
            Route::new(HttpMethod::Get, "/api/data", "getData"),
            Route::new(HttpMethod::Get, "/api/data", "postData"),
        ];

        let err = validate(&routes, &HandlerRegistry::standard()).unwrap_err();
        assert!(matches!(err, DataApiError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_empty_registry_rejects_every_route() {
        let err = validate(ROUTES, &HandlerRegistry::new()).unwrap_err();
        assert!(err.to_string().contains("getData"));
    }
}
