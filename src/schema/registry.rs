use super::oid_registry::OidRegistry;
use std::collections::HashMap;
use std::fmt;

/// Failures of the schema registries; a taxonomy of their own, never
/// mapped into protocol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    NotRegistered(String),
    AlreadyRegistered(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotRegistered(id) => {
                write!(f, "schema object {} is not registered", id)
            }
            RegistryError::AlreadyRegistered(oid) => {
                write!(f, "schema object {} has already been registered", oid)
            }
        }
    }
}

/// Anything registrable by OID under a schema: matching rules,
/// attribute types, object classes and their kin.
pub trait SchemaObject {
    fn oid(&self) -> &str;
    /// The user-visible aliases of the object.
    fn names(&self) -> &[String];
}

/// Observer of registry activity. Every mutating or failing operation
/// notifies the monitor; the default implementation ignores it all.
pub trait RegistryMonitor<T: SchemaObject> {
    fn registered(&self, _obj: &T) {}
    fn register_failed(&self, _obj: &T, _error: &RegistryError) {}
    fn looked_up(&self, _obj: &T) {}
    fn lookup_failed(&self, _id: &str, _error: &RegistryError) {}
}

/// The monitor a registry starts with.
#[derive(Debug, Default)]
pub struct NullRegistryMonitor;

impl<T: SchemaObject> RegistryMonitor<T> for NullRegistryMonitor {}

/// The immutable tier: schema objects loaded at startup before any
/// user-supplied schema exists. Populated once, then only read.
#[derive(Debug, Default)]
pub struct BootstrapRegistry<T> {
    by_oid: HashMap<String, T>,
    oid_to_schema: HashMap<String, String>,
}

impl<T: SchemaObject> BootstrapRegistry<T> {
    pub fn new() -> Self {
        return Self {
            by_oid: HashMap::new(),
            oid_to_schema: HashMap::new(),
        };
    }

    /// Loads one bootstrap object. Meant for startup wiring; the tier
    /// is immutable once handed to a [`SchemaRegistry`].
    pub fn load(&mut self, schema: &str, obj: T) {
        self.oid_to_schema
            .insert(obj.oid().to_string(), schema.to_string());
        self.by_oid.insert(obj.oid().to_string(), obj);
    }

    pub fn contains(&self, oid: &str) -> bool {
        return self.by_oid.contains_key(oid);
    }

    pub fn lookup(&self, oid: &str) -> Option<&T> {
        return self.by_oid.get(oid);
    }

    pub fn schema_name(&self, oid: &str) -> Option<&str> {
        return self.oid_to_schema.get(oid).map(String::as_str);
    }

    pub fn list(&self) -> impl Iterator<Item = &T> {
        return self.by_oid.values();
    }
}

/// Two-tier schema object registry: a mutable overlay over the
/// bootstrap tier, with all lookups normalized through the OID
/// registry first. Overlay mutations must be serialized against
/// concurrent readers by the caller; single-writer/many-reader is
/// sufficient.
pub struct SchemaRegistry<T: SchemaObject> {
    by_oid: HashMap<String, T>,
    oid_to_schema: HashMap<String, String>,
    oid_registry: OidRegistry,
    bootstrap: BootstrapRegistry<T>,
    monitor: Box<dyn RegistryMonitor<T> + Send + Sync>,
}

impl<T: SchemaObject + Clone> SchemaRegistry<T> {
    pub fn new(bootstrap: BootstrapRegistry<T>) -> Self {
        let mut oid_registry = OidRegistry::new();
        for obj in bootstrap.list() {
            for name in obj.names() {
                oid_registry.register(name, obj.oid());
            }
        }

        return Self {
            by_oid: HashMap::new(),
            oid_to_schema: HashMap::new(),
            oid_registry,
            bootstrap,
            monitor: Box::new(NullRegistryMonitor),
        };
    }

    /// Replaces the monitor notified of registry events.
    pub fn set_monitor(
        &mut self,
        monitor: Box<dyn RegistryMonitor<T> + Send + Sync>,
    ) {
        self.monitor = monitor;
    }

    /// Inserts `obj` into the overlay under `schema`. An OID already
    /// present in either tier refuses the whole registration, leaving
    /// the overlay untouched.
    pub fn register(
        &mut self,
        schema: &str,
        obj: T,
    ) -> Result<(), RegistryError> {
        let oid = obj.oid().to_string();

        if self.by_oid.contains_key(&oid) || self.bootstrap.contains(&oid) {
            let error = RegistryError::AlreadyRegistered(oid);
            self.monitor.register_failed(&obj, &error);
            return Err(error);
        }

        for name in obj.names() {
            self.oid_registry.register(name, &oid);
        }
        self.oid_to_schema.insert(oid.clone(), schema.to_string());
        self.by_oid.insert(oid, obj.clone());
        self.monitor.registered(&obj);
        return Ok(());
    }

    /// Resolves `id` (an OID or an alias) to the registered object,
    /// overlay first, bootstrap second.
    pub fn lookup(&self, id: &str) -> Result<&T, RegistryError> {
        let oid = match self.oid_registry.resolve(id) {
            Ok(oid) => oid,
            Err(error) => {
                self.monitor.lookup_failed(id, &error);
                return Err(error);
            }
        };

        if let Some(obj) = self.by_oid.get(&oid) {
            self.monitor.looked_up(obj);
            return Ok(obj);
        }

        if let Some(obj) = self.bootstrap.lookup(&oid) {
            self.monitor.looked_up(obj);
            return Ok(obj);
        }

        let error = RegistryError::NotRegistered(oid);
        self.monitor.lookup_failed(id, &error);
        return Err(error);
    }

    pub fn has(&self, id: &str) -> bool {
        match self.oid_registry.resolve(id) {
            Ok(oid) => {
                return self.by_oid.contains_key(&oid)
                    || self.bootstrap.contains(&oid);
            }
            Err(_) => {
                return false;
            }
        }
    }

    /// The schema the object with `id` was registered under.
    pub fn schema_name(&self, id: &str) -> Result<&str, RegistryError> {
        let oid = self.oid_registry.resolve(id)?;

        if let Some(schema) = self.oid_to_schema.get(&oid) {
            return Ok(schema);
        }
        if let Some(schema) = self.bootstrap.schema_name(&oid) {
            return Ok(schema);
        }

        return Err(RegistryError::NotRegistered(oid));
    }

    /// All registered objects, each OID exactly once; the register
    /// invariant keeps the tiers disjoint.
    pub fn list(&self) -> impl Iterator<Item = &T> {
        return self.by_oid.values().chain(self.bootstrap.list());
    }
}
