use kerberos_asn1::PrincipalName;
use kerberos_constants::principal_names;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A Kerberos principal: a realm plus the ordered name parts. Two
/// principals are equal exactly when realm and name parts match; the
/// name type is carried for the wire but ignored by comparison.
#[derive(Debug, Clone)]
pub struct KrbPrincipal {
    realm: String,
    name: PrincipalName,
}

impl KrbPrincipal {
    pub fn new(name: PrincipalName, realm: String) -> Self {
        return Self { realm, name };
    }

    /// The ticket-granting service principal `krbtgt/REALM` of a realm.
    pub fn krbtgt(realm: &str) -> Self {
        return Self {
            realm: realm.to_string(),
            name: PrincipalName {
                name_type: principal_names::NT_SRV_INST,
                name_string: vec!["krbtgt".to_string(), realm.to_string()],
            },
        };
    }

    pub fn realm(&self) -> &str {
        return &self.realm;
    }

    pub fn name(&self) -> &PrincipalName {
        return &self.name;
    }

    /// The name parts joined with '/', without the realm.
    pub fn name_string(&self) -> String {
        return self.name.name_string.join("/");
    }
}

impl PartialEq for KrbPrincipal {
    fn eq(&self, other: &Self) -> bool {
        return self.realm == other.realm
            && self.name.name_string == other.name.name_string;
    }
}

impl Eq for KrbPrincipal {}

impl Hash for KrbPrincipal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.realm.hash(state);
        self.name.name_string.hash(state);
    }
}

impl fmt::Display for KrbPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}@{}", self.name_string(), self.realm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt_principal(name: &str) -> PrincipalName {
        return PrincipalName {
            name_type: principal_names::NT_PRINCIPAL,
            name_string: vec![name.to_string()],
        };
    }

    #[test]
    fn test_equality_ignores_name_type() {
        let by_principal = KrbPrincipal::new(
            nt_principal("alice"),
            "EXAMPLE.COM".to_string(),
        );
        let by_unknown = KrbPrincipal::new(
            PrincipalName {
                name_type: principal_names::NT_UNKNOWN,
                name_string: vec!["alice".to_string()],
            },
            "EXAMPLE.COM".to_string(),
        );

        assert_eq!(by_principal, by_unknown);
    }

    #[test]
    fn test_equality_requires_same_realm_and_parts() {
        let alice = KrbPrincipal::new(
            nt_principal("alice"),
            "EXAMPLE.COM".to_string(),
        );
        let other_realm = KrbPrincipal::new(
            nt_principal("alice"),
            "OTHER.COM".to_string(),
        );
        let bob =
            KrbPrincipal::new(nt_principal("bob"), "EXAMPLE.COM".to_string());

        assert_ne!(alice, other_realm);
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_krbtgt_display() {
        let krbtgt = KrbPrincipal::krbtgt("EXAMPLE.COM");
        assert_eq!("krbtgt/EXAMPLE.COM@EXAMPLE.COM", krbtgt.to_string());
    }
}
