//! The embedded Key Distribution Center: configuration, collaborator
//! contracts and the Ticket-Granting Service.

mod config;
pub use config::KdcConfig;

mod crypto;
pub use crypto::{random_key, ChecksumHandler, CipherTextHandler};

mod flags;
pub use flags::{KdcOptionSet, TicketFlagSet, RESERVED_KDC_OPTIONS};

mod principal;
pub use principal::KrbPrincipal;

mod replay;
pub use replay::{AuthenticatorIdentity, MemoryReplayCache, ReplayCache};

mod store;
pub use store::{
    get_entry, MemoryPrincipalStore, PrincipalStore, PrincipalStoreEntry,
};

mod time;
pub use time::KdcTime;

pub mod tgs;
