//! Schema object registries: a mutable overlay over an immutable
//! bootstrap tier, keyed by OID with alias normalization.

mod matching_rule;
pub use matching_rule::MatchingRule;

mod oid_registry;
pub use oid_registry::OidRegistry;

mod registry;
pub use registry::{
    BootstrapRegistry, NullRegistryMonitor, RegistryError, RegistryMonitor,
    SchemaObject, SchemaRegistry,
};
