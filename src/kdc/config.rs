use super::principal::KrbPrincipal;
use kerberos_crypto::supported_etypes;

const MINUTE: i64 = 60 * 1000;
const DAY: i64 = 24 * 60 * MINUTE;

/// Runtime policy of the KDC host. Read-only from the service's
/// perspective; a host reloading configuration swaps the shared
/// reference atomically.
#[derive(Debug, Clone)]
pub struct KdcConfig {
    pub primary_realm: String,
    /// The KDC's own ticket-granting service principal (`krbtgt/REALM`).
    pub service_principal: KrbPrincipal,
    /// Encryption types the KDC will negotiate, in preference order.
    pub encryption_types: Vec<i32>,
    pub allowable_clock_skew: i64,
    pub maximum_ticket_lifetime: i64,
    pub maximum_renewable_lifetime: i64,
    pub body_checksum_verified: bool,
    pub empty_addresses_allowed: bool,
    pub forwardable_allowed: bool,
    pub proxiable_allowed: bool,
    pub postdated_allowed: bool,
    pub renewable_allowed: bool,
}

impl KdcConfig {
    pub fn new(primary_realm: &str) -> Self {
        return Self {
            primary_realm: primary_realm.to_string(),
            service_principal: KrbPrincipal::krbtgt(primary_realm),
            encryption_types: supported_etypes(),
            allowable_clock_skew: 5 * MINUTE,
            maximum_ticket_lifetime: DAY,
            maximum_renewable_lifetime: 7 * DAY,
            body_checksum_verified: true,
            empty_addresses_allowed: true,
            forwardable_allowed: true,
            proxiable_allowed: true,
            postdated_allowed: true,
            renewable_allowed: true,
        };
    }
}

impl Default for KdcConfig {
    fn default() -> Self {
        return Self::new("EXAMPLE.COM");
    }
}
