//! Route → required roles table consulted by the guard.
//!
//! An empty role set means the route is open to anonymous callers. A
//! per-route entry overrides the default of its group.

use std::collections::HashMap;

use axum::http::Method;
use judge_core::models::auth::Role;

/// Roles allowed on a route. Empty means anonymous access.
pub type RequiredRoles = Vec<Role>;

#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    /// `(path prefix, roles)`, matched on whole path segments.
    groups: Vec<(String, RequiredRoles)>,
    routes: HashMap<(Method, String), RequiredRoles>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default roles for every route under `prefix`.
    pub fn group(mut self, prefix: &str, roles: &[Role]) -> Self {
        self.groups
            .push((prefix.trim_end_matches('/').to_string(), roles.to_vec()));
        self
    }

    /// Roles for one route, keyed by method and route template.
    pub fn route(mut self, method: Method, path: &str, roles: &[Role]) -> Self {
        self.routes.insert((method, path.to_string()), roles.to_vec());
        self
    }

    /// Resolve the roles for a request. The longest matching group wins
    /// when no route entry exists.
    pub fn required(&self, method: &Method, path: &str) -> &[Role] {
        if let Some(roles) = self.routes.get(&(method.clone(), path.to_string())) {
            return roles;
        }
        self.groups
            .iter()
            .filter(|(prefix, _)| under_prefix(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, roles)| roles.as_slice())
            .unwrap_or(&[])
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
