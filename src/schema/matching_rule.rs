use super::registry::SchemaObject;

/// A matching rule: how values of its syntax are compared during
/// search and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRule {
    pub oid: String,
    pub names: Vec<String>,
    pub syntax_oid: String,
    pub obsolete: bool,
}

impl MatchingRule {
    pub fn new(oid: &str, names: &[&str], syntax_oid: &str) -> Self {
        return Self {
            oid: oid.to_string(),
            names: names.iter().map(|name| name.to_string()).collect(),
            syntax_oid: syntax_oid.to_string(),
            obsolete: false,
        };
    }
}

impl SchemaObject for MatchingRule {
    fn oid(&self) -> &str {
        return &self.oid;
    }

    fn names(&self) -> &[String] {
        return &self.names;
    }
}
