use super::registry::RegistryError;
use std::collections::HashMap;

/// Maps user-visible schema object names to their canonical OIDs.
/// Numeric OIDs pass through untouched; aliases resolve
/// case-insensitively.
#[derive(Debug, Default)]
pub struct OidRegistry {
    by_name: HashMap<String, String>,
}

impl OidRegistry {
    pub fn new() -> Self {
        return Self {
            by_name: HashMap::new(),
        };
    }

    pub fn register(&mut self, name: &str, oid: &str) {
        self.by_name.insert(name.to_lowercase(), oid.to_string());
    }

    pub fn resolve(&self, id: &str) -> Result<String, RegistryError> {
        if is_numeric_oid(id) {
            return Ok(id.to_string());
        }

        return self
            .by_name
            .get(&id.to_lowercase())
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(id.to_string()));
    }

    pub fn has_oid(&self, id: &str) -> bool {
        return is_numeric_oid(id)
            || self.by_name.contains_key(&id.to_lowercase());
    }
}

fn is_numeric_oid(id: &str) -> bool {
    return id
        .chars()
        .next()
        .map(|first| first.is_ascii_digit())
        .unwrap_or(false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_oids_pass_through() {
        let registry = OidRegistry::new();
        assert_eq!(
            "2.5.13.2".to_string(),
            registry.resolve("2.5.13.2").unwrap()
        );
    }

    #[test]
    fn test_aliases_resolve_case_insensitively() {
        let mut registry = OidRegistry::new();
        registry.register("caseIgnoreMatch", "2.5.13.2");

        assert_eq!(
            "2.5.13.2".to_string(),
            registry.resolve("CASEIGNOREMATCH").unwrap()
        );
        assert!(registry.has_oid("caseignorematch"));
    }

    #[test]
    fn test_unknown_alias_is_not_registered() {
        let registry = OidRegistry::new();
        assert_eq!(
            Err(RegistryError::NotRegistered("nosuch".to_string())),
            registry.resolve("nosuch")
        );
        assert!(!registry.has_oid("nosuch"));
    }
}
