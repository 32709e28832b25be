use super::ticket::TicketBody;
use crate::error::{KerberosError, Result};
use crate::kdc::config::KdcConfig;
use crate::kdc::crypto::{ChecksumHandler, CipherTextHandler};
use crate::kdc::flags::KdcOptionSet;
use crate::kdc::replay::ReplayCache;
use crate::kdc::store::{PrincipalStore, PrincipalStoreEntry};
use crate::kdc::time::KdcTime;
use kerberos_asn1::{
    ApReq, Authenticator, EncTicketPart, KdcReq, TgsRep, Ticket,
};
use std::net::IpAddr;
use std::sync::Arc;

/// Mutable bag threaded through the Ticket-Granting Service stages.
/// One context belongs to exactly one `execute` invocation; only the
/// replay cache behind it is shared with other requests.
pub struct TicketGrantingContext {
    pub config: Arc<KdcConfig>,
    pub store: Arc<dyn PrincipalStore>,
    pub replay_cache: Arc<dyn ReplayCache>,
    pub cipher_text_handler: CipherTextHandler,
    pub checksum_handler: ChecksumHandler,

    pub request: KdcReq,
    /// Exact octets of the req-body as received from the wire; the
    /// authenticator checksum was computed over these.
    pub body_bytes: Option<Vec<u8>>,
    pub client_address: Option<IpAddr>,
    /// Server time the request is judged against, captured at creation.
    pub now: KdcTime,

    pub(crate) encryption_type: Option<i32>,
    pub(crate) auth_header: Option<ApReq>,
    pub(crate) tgt: Option<Ticket>,
    pub(crate) tgt_body: Option<TicketBody>,
    pub(crate) ticket_principal_entry: Option<PrincipalStoreEntry>,
    pub(crate) authenticator: Option<Authenticator>,
    pub(crate) request_principal_entry: Option<PrincipalStoreEntry>,
    pub(crate) new_ticket: Option<Ticket>,
    pub(crate) new_ticket_part: Option<EncTicketPart>,
    pub(crate) reply: Option<TgsRep>,
}

impl TicketGrantingContext {
    pub fn new(
        config: Arc<KdcConfig>,
        store: Arc<dyn PrincipalStore>,
        replay_cache: Arc<dyn ReplayCache>,
        request: KdcReq,
    ) -> Self {
        return Self {
            config,
            store,
            replay_cache,
            cipher_text_handler: CipherTextHandler::new(),
            checksum_handler: ChecksumHandler::new(),
            request,
            body_bytes: None,
            client_address: None,
            now: KdcTime::now(),
            encryption_type: None,
            auth_header: None,
            tgt: None,
            tgt_body: None,
            ticket_principal_entry: None,
            authenticator: None,
            request_principal_entry: None,
            new_ticket: None,
            new_ticket_part: None,
            reply: None,
        };
    }

    pub fn options(&self) -> KdcOptionSet {
        return KdcOptionSet::from_bits(
            self.request.req_body.kdc_options.flags,
        );
    }

    pub fn reply(&self) -> Option<&TgsRep> {
        return self.reply.as_ref();
    }

    pub(crate) fn selected_etype(&self) -> Result<i32> {
        return self
            .encryption_type
            .ok_or_else(|| KerberosError::generic("etype not selected"));
    }

    pub(crate) fn auth_header(&self) -> Result<&ApReq> {
        return self
            .auth_header
            .as_ref()
            .ok_or_else(|| KerberosError::generic("AP-REQ not extracted"));
    }

    pub(crate) fn tgt(&self) -> Result<&Ticket> {
        return self
            .tgt
            .as_ref()
            .ok_or_else(|| KerberosError::generic("TGT not extracted"));
    }

    pub(crate) fn tgt_part(&self) -> Result<&EncTicketPart> {
        return self
            .tgt_body
            .as_ref()
            .ok_or_else(|| KerberosError::generic("TGT not decrypted"))?
            .open_part();
    }

    pub(crate) fn take_tgt_body(&mut self) -> Result<TicketBody> {
        return self
            .tgt_body
            .take()
            .ok_or_else(|| KerberosError::generic("TGT not extracted"));
    }

    pub(crate) fn ticket_entry(&self) -> Result<&PrincipalStoreEntry> {
        return self.ticket_principal_entry.as_ref().ok_or_else(|| {
            KerberosError::generic("ticket principal not resolved")
        });
    }

    pub(crate) fn authenticator(&self) -> Result<&Authenticator> {
        return self
            .authenticator
            .as_ref()
            .ok_or_else(|| KerberosError::generic("authenticator not verified"));
    }

    pub(crate) fn request_entry(&self) -> Result<&PrincipalStoreEntry> {
        return self.request_principal_entry.as_ref().ok_or_else(|| {
            KerberosError::generic("request principal not resolved")
        });
    }

    pub(crate) fn new_ticket(&self) -> Result<&Ticket> {
        return self
            .new_ticket
            .as_ref()
            .ok_or_else(|| KerberosError::generic("ticket not generated"));
    }

    pub(crate) fn new_ticket_part(&self) -> Result<&EncTicketPart> {
        return self
            .new_ticket_part
            .as_ref()
            .ok_or_else(|| KerberosError::generic("ticket not generated"));
    }
}
