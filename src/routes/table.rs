//! Static mapping from URL prefixes to handler groups.

use crate::error::{AppError, AppResult};
use axum::Router;
use std::sync::Arc;

use super::resources::resource_routes;
use super::AppState;

/// Prefixes served by the school backend and the collection behind each.
pub const SCHOOL_ROUTES: [(&str, &str); 14] = [
    ("/api/teacher", "teachers"),
    ("/api/v1/students", "students"),
    ("/api/v1/teachers", "teachers"),
    ("/api/v1/assignments", "assignments"),
    ("/api/v1/announcements", "announcements"),
    ("/api/v1/class", "classes"),
    ("/api/v1/library", "library"),
    ("/api/v1/events", "events"),
    ("/api/v1/exam", "exams"),
    ("/api/v1/attendance", "attendance"),
    ("/api/v1/users", "users"),
    ("/api/v1/register", "admins"),
    ("/api/v1/email", "emails"),
    ("/api/v1/studentfees", "studentfees"),
];

/// One registered handler group.
pub struct Mount {
    pub prefix: String,
    pub router: Router<Arc<AppState>>,
}

/// Ordered set of handler groups with disjoint prefixes.
#[derive(Default)]
pub struct RouteTable {
    mounts: Vec<Mount>,
}

/// `true` when one prefix is a path-segment prefix of the other.
fn overlaps(a: &str, b: &str) -> bool {
    let nested = |outer: &str, inner: &str| {
        inner == outer || inner.strip_prefix(outer).is_some_and(|rest| rest.starts_with('/'))
    };
    nested(a, b) || nested(b, a)
}

fn validate_prefix(prefix: &str) -> AppResult<()> {
    let well_formed = prefix.len() > 1
        && prefix.starts_with('/')
        && !prefix.ends_with('/')
        && !prefix.contains("//")
        && !prefix.contains(['{', '}', '*']);

    if well_formed {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "Invalid route prefix: {:?}",
            prefix
        )))
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The school backend's handler groups.
    pub fn school() -> AppResult<Self> {
        SCHOOL_ROUTES
            .into_iter()
            .try_fold(Self::new(), |table, (prefix, collection)| {
                table.mount(prefix, resource_routes(collection))
            })
    }

    /// Register a handler group; the prefix must not overlap an existing one.
    pub fn mount(
        mut self,
        prefix: impl Into<String>,
        router: Router<Arc<AppState>>,
    ) -> AppResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;

        if let Some(existing) = self.mounts.iter().find(|m| overlaps(&m.prefix, &prefix)) {
            return Err(AppError::Configuration(format!(
                "Route prefix {} overlaps {}",
                prefix, existing.prefix
            )));
        }

        self.mounts.push(Mount { prefix, router });
        Ok(self)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|m| m.prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Nest every handler group under its prefix.
    pub fn into_router(self) -> Router<Arc<AppState>> {
        self.mounts
            .into_iter()
            .fold(Router::new(), |app, mount| {
                tracing::debug!(prefix = %mount.prefix, "Mounting handler group");
                app.nest(&mount.prefix, mount.router)
            })
    }
}
