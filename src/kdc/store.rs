use super::principal::KrbPrincipal;
use crate::error::{KerberosError, Result};
use kerberos_asn1::EncryptionKey;
use kerberos_crypto::new_kerberos_cipher;
use std::collections::HashMap;

/// Directory entry backing a principal: its key material per encryption
/// type plus the naming attributes the KDC reports.
#[derive(Debug, Clone)]
pub struct PrincipalStoreEntry {
    pub principal: KrbPrincipal,
    pub common_name: String,
    pub realm_name: String,
    pub key_map: HashMap<i32, EncryptionKey>,
}

impl PrincipalStoreEntry {
    pub fn key_for(&self, etype: i32) -> Option<&EncryptionKey> {
        return self.key_map.get(&etype);
    }
}

/// Source of principal entries, typically the directory partition that
/// hosts the realm.
pub trait PrincipalStore: Send + Sync {
    /// `Ok(None)` when the principal does not exist; `Err` only for
    /// store failures.
    fn lookup(
        &self,
        principal: &KrbPrincipal,
    ) -> Result<Option<PrincipalStoreEntry>>;
}

/// Resolves a principal through the store, translating a miss into the
/// given protocol error.
pub fn get_entry(
    store: &dyn PrincipalStore,
    principal: &KrbPrincipal,
    miss_error: i32,
) -> Result<PrincipalStoreEntry> {
    return store
        .lookup(principal)?
        .ok_or_else(|| KerberosError::new(miss_error));
}

/// Map-backed principal store, also the reference semantics for
/// directory-backed implementations.
#[derive(Debug, Default)]
pub struct MemoryPrincipalStore {
    entries: HashMap<KrbPrincipal, PrincipalStoreEntry>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        return Self {
            entries: HashMap::new(),
        };
    }

    pub fn add(&mut self, entry: PrincipalStoreEntry) {
        self.entries.insert(entry.principal.clone(), entry);
    }

    /// Registers a principal deriving one key per requested encryption
    /// type from its secret, salted the customary way with realm and
    /// name.
    pub fn add_with_secret(
        &mut self,
        principal: KrbPrincipal,
        common_name: &str,
        secret: &str,
        etypes: &[i32],
    ) -> Result<()> {
        let mut key_map = HashMap::new();
        for &etype in etypes {
            let cipher = new_kerberos_cipher(etype).map_err(|_| {
                KerberosError::generic(format!("unknown etype {}", etype))
            })?;
            let salt = cipher
                .generate_salt(principal.realm(), &principal.name_string());
            let key_value = cipher.generate_key_from_string(secret, &salt);
            key_map.insert(
                etype,
                EncryptionKey {
                    keytype: etype,
                    keyvalue: key_value,
                },
            );
        }

        let realm_name = principal.realm().to_string();
        self.add(PrincipalStoreEntry {
            principal,
            common_name: common_name.to_string(),
            realm_name,
            key_map,
        });
        return Ok(());
    }
}

impl PrincipalStore for MemoryPrincipalStore {
    fn lookup(
        &self,
        principal: &KrbPrincipal,
    ) -> Result<Option<PrincipalStoreEntry>> {
        return Ok(self.entries.get(principal).cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kerberos_constants::error_codes;
    use kerberos_constants::etypes;

    #[test]
    fn test_lookup_returns_registered_entry() {
        let mut store = MemoryPrincipalStore::new();
        let principal = KrbPrincipal::krbtgt("EXAMPLE.COM");
        store
            .add_with_secret(
                principal.clone(),
                "KDC Service",
                "s3cret",
                &[etypes::AES256_CTS_HMAC_SHA1_96],
            )
            .unwrap();

        let entry = store.lookup(&principal).unwrap().unwrap();
        assert_eq!("KDC Service", entry.common_name);
        assert!(entry.key_for(etypes::AES256_CTS_HMAC_SHA1_96).is_some());
        assert!(entry.key_for(etypes::RC4_HMAC).is_none());
    }

    #[test]
    fn test_get_entry_translates_miss() {
        let store = MemoryPrincipalStore::new();
        let principal = KrbPrincipal::krbtgt("NOWHERE.COM");

        let error = get_entry(
            &store,
            &principal,
            error_codes::KDC_ERR_S_PRINCIPAL_UNKNOWN,
        )
        .unwrap_err();

        assert_eq!(
            error_codes::KDC_ERR_S_PRINCIPAL_UNKNOWN,
            error.error_code()
        );
    }
}
