//! Pieces of an LDAP directory server with an embedded Kerberos V5 KDC:
//! the Ticket-Granting Service, the one-level children cursor of the
//! backend store, and the two-tier schema object registries.

pub mod error;
pub mod kdc;
pub mod schema;
pub mod xdbm;

pub use error::{KerberosError, Result};
