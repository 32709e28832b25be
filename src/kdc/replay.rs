use super::time::KdcTime;
use std::collections::HashMap;
use std::sync::Mutex;

/// Identity of an authenticator, the tuple replays are detected on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthenticatorIdentity {
    pub cname: String,
    pub crealm: String,
    pub ctime: KdcTime,
    pub cusec: i32,
}

/// Replay protection shared by every concurrent exchange. The single
/// check-and-insert must be linearizable: of two requests presenting the
/// same authenticator identity, exactly one may pass.
pub trait ReplayCache: Send + Sync {
    /// `true` when the identity was fresh and has been recorded; `false`
    /// when it was already present within the TTL window.
    fn check_and_insert(&self, identity: AuthenticatorIdentity) -> bool;
}

/// Mutex-serialized in-process cache. Entries expire after the TTL,
/// which callers set to the allowable clock skew.
#[derive(Debug)]
pub struct MemoryReplayCache {
    ttl: i64,
    seen: Mutex<HashMap<AuthenticatorIdentity, KdcTime>>,
}

impl MemoryReplayCache {
    pub fn new(ttl_millis: i64) -> Self {
        return Self {
            ttl: ttl_millis,
            seen: Mutex::new(HashMap::new()),
        };
    }
}

impl ReplayCache for MemoryReplayCache {
    fn check_and_insert(&self, identity: AuthenticatorIdentity) -> bool {
        let now = KdcTime::now();

        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        seen.retain(|_, expiry| *expiry > now);

        if seen.contains_key(&identity) {
            return false;
        }

        seen.insert(identity, now.plus(self.ttl));
        return true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(cusec: i32) -> AuthenticatorIdentity {
        return AuthenticatorIdentity {
            cname: "alice".to_string(),
            crealm: "EXAMPLE.COM".to_string(),
            ctime: KdcTime::from_millis(1_600_000_000_000),
            cusec,
        };
    }

    #[test]
    fn test_second_insert_of_same_identity_is_replay() {
        let cache = MemoryReplayCache::new(5 * 60 * 1000);

        assert!(cache.check_and_insert(identity(42)));
        assert!(!cache.check_and_insert(identity(42)));
    }

    #[test]
    fn test_distinct_identities_do_not_collide() {
        let cache = MemoryReplayCache::new(5 * 60 * 1000);

        assert!(cache.check_and_insert(identity(1)));
        assert!(cache.check_and_insert(identity(2)));
    }

    #[test]
    fn test_expired_entries_are_purged() {
        let cache = MemoryReplayCache::new(0);

        assert!(cache.check_and_insert(identity(7)));
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.check_and_insert(identity(7)));
    }
}
