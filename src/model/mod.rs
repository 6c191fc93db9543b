//! # Handler Model
//!
//! Shared data types produced by the annotation parser and read by the
//! validator and every emitter. Handlers are built once per scan and never
//! mutated afterwards.

mod naming;
mod types;

pub use naming::{to_kebab_case, to_snake_case};
pub use types::*;

use std::collections::BTreeMap;

/// Container handlers emitted together as one runtime package.
#[derive(Debug, Clone)]
pub struct ServiceGroup<'a> {
    pub name: String,
    pub handlers: Vec<&'a Handler>,
}

impl ServiceGroup<'_> {
    /// Directory and service name, e.g. `user-service`.
    pub fn kebab_name(&self) -> String {
        to_kebab_case(&self.name)
    }

    /// Largest timeout declared in the group, in seconds.
    pub fn max_timeout_secs(&self) -> Option<u64> {
        self.handlers.iter().filter_map(|h| h.timeout_secs()).max()
    }

    pub fn max_concurrency(&self) -> Option<i64> {
        self.handlers.iter().filter_map(|h| h.concurrency).max()
    }

    /// Distinct `(package_name, package_path)` pairs, sorted by path. An
    /// empty path is the module root package.
    pub fn package_imports(&self) -> Vec<(&str, &str)> {
        let mut imports: BTreeMap<&str, &str> = BTreeMap::new();
        for h in &self.handlers {
            imports.insert(h.package_path.as_str(), h.package_name.as_str());
        }
        imports.into_iter().map(|(path, name)| (name, path)).collect()
    }
}

/// Group container handlers by [`Handler::group_name`].
///
/// Groups come back sorted by name; handlers keep their input order.
pub fn service_groups(handlers: &[Handler]) -> Vec<ServiceGroup<'_>> {
    let mut map: BTreeMap<&str, Vec<&Handler>> = BTreeMap::new();
    for h in handlers.iter().filter(|h| h.is_container()) {
        map.entry(h.group_name()).or_default().push(h);
    }
    map.into_iter()
        .map(|(name, handlers)| ServiceGroup {
            name: name.to_string(),
            handlers,
        })
        .collect()
}

/// Handlers grouped by package (or service override), for resources that are
/// created once per group regardless of target, such as service accounts.
pub fn groups_by_name<'a>(handlers: impl IntoIterator<Item = &'a Handler>) -> BTreeMap<&'a str, Vec<&'a Handler>> {
    let mut map: BTreeMap<&str, Vec<&Handler>> = BTreeMap::new();
    for h in handlers {
        map.entry(h.group_name()).or_default().push(h);
    }
    map
}

pub fn function_handlers(handlers: &[Handler]) -> Vec<&Handler> {
    handlers.iter().filter(|h| h.is_function()).collect()
}

#[cfg(test)]
mod tests;
