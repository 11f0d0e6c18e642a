//! Route name -> table mapping, built once from the trusted allow-list.

use crate::case::to_camel_case;
use crate::error::ConfigError;
use crate::intent::SafeIdentifier;
use std::collections::HashMap;

/// Paths served by the common routes; no table may shadow them.
pub const RESERVED_ROUTES: &[&str] = &["health", "ready", "version"];

#[derive(Clone, Debug)]
pub struct TableRoute {
    /// Path segment clients use, camelCase of the table name (e.g. "motorCycles").
    pub route_name: String,
    pub table: SafeIdentifier,
}

/// Closed set of queryable tables. Anything not registered here is unreachable.
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    routes: Vec<TableRoute>,
    by_route: HashMap<String, usize>,
}

impl TableRegistry {
    pub fn from_allow_list<S: AsRef<str>>(tables: &[S]) -> Result<Self, ConfigError> {
        if tables.is_empty() {
            return Err(ConfigError::NoTables);
        }
        let mut registry = TableRegistry::default();
        for name in tables {
            let name = name.as_ref();
            let table = SafeIdentifier::new(name).ok_or_else(|| ConfigError::InvalidTable(name.to_string()))?;
            let route_name = to_camel_case(name);
            if RESERVED_ROUTES.contains(&route_name.as_str()) {
                return Err(ConfigError::ReservedRoute(route_name));
            }
            if registry.by_route.contains_key(&route_name) {
                return Err(ConfigError::DuplicateRoute(route_name));
            }
            registry.by_route.insert(route_name.clone(), registry.routes.len());
            registry.routes.push(TableRoute { route_name, table });
        }
        Ok(registry)
    }

    pub fn table_by_route(&self, route_name: &str) -> Option<&SafeIdentifier> {
        self.by_route.get(route_name).map(|&i| &self.routes[i].table)
    }

    pub fn routes(&self) -> &[TableRoute] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_use_camel_case_names() {
        let r = TableRegistry::from_allow_list(&["cars", "motor_cycles"]).unwrap();
        assert_eq!(r.table_by_route("cars").unwrap().as_str(), "cars");
        assert_eq!(r.table_by_route("motorCycles").unwrap().as_str(), "motor_cycles");
        assert!(r.table_by_route("motor_cycles").is_none());
        assert!(r.table_by_route("planes").is_none());
        let names: Vec<_> = r.routes().iter().map(|t| t.route_name.as_str()).collect();
        assert_eq!(names, vec!["cars", "motorCycles"]);
    }

    #[test]
    fn invalid_table_names_are_rejected() {
        assert!(matches!(
            TableRegistry::from_allow_list(&["cars; DROP TABLE x"]),
            Err(ConfigError::InvalidTable(_))
        ));
        assert!(matches!(
            TableRegistry::from_allow_list(&["sales_q1", "salesQ1"]),
            Err(ConfigError::DuplicateRoute(_))
        ));
        assert!(matches!(
            TableRegistry::from_allow_list(&["cars", "health"]),
            Err(ConfigError::ReservedRoute(_))
        ));
        assert!(matches!(TableRegistry::from_allow_list::<&str>(&[]), Err(ConfigError::NoTables)));
    }
}
