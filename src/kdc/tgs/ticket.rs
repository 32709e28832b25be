use crate::error::{KerberosError, Result};
use crate::kdc::crypto::CipherTextHandler;
use crate::kdc::flags::TicketFlagSet;
use crate::kdc::time::KdcTime;
use kerberos_asn1::{
    Asn1Object, AuthorizationData, EncTicketPart, EncryptedData,
    EncryptionKey, HostAddresses, PrincipalName, Realm, TransitedEncoding,
};
use kerberos_constants::error_codes;

/// Enc-part of a ticket as the KDC holds it: still sealed from the
/// wire, or open once the server key has been applied.
#[derive(Debug, Clone)]
pub enum TicketBody {
    Sealed(EncryptedData),
    Open(EncTicketPart),
}

impl TicketBody {
    /// Applies the server key, turning a sealed body into an open one.
    /// Opening an already open body is a no-op.
    pub fn unseal(
        self,
        handler: &CipherTextHandler,
        key: &EncryptionKey,
        key_usage: i32,
    ) -> Result<TicketBody> {
        match self {
            TicketBody::Sealed(data) => {
                let plain = handler.unseal(key, &data, key_usage)?;
                let (_, part) =
                    EncTicketPart::parse(&plain).map_err(|_| {
                        KerberosError::with_text(
                            error_codes::KRB_AP_ERR_MODIFIED,
                            "unparseable ticket enc-part",
                        )
                    })?;
                return Ok(TicketBody::Open(part));
            }
            open @ TicketBody::Open(_) => {
                return Ok(open);
            }
        }
    }

    pub fn open_part(&self) -> Result<&EncTicketPart> {
        match self {
            TicketBody::Open(part) => {
                return Ok(part);
            }
            TicketBody::Sealed(_) => {
                return Err(KerberosError::generic(
                    "ticket enc-part is still sealed",
                ));
            }
        }
    }
}

/// Accumulates the body of the ticket being issued while the stages
/// apply flag, authorization and lifetime policy to it.
#[derive(Debug, Clone)]
pub struct EncTicketPartBuilder {
    flags: TicketFlagSet,
    key: Option<EncryptionKey>,
    crealm: Realm,
    cname: PrincipalName,
    transited: TransitedEncoding,
    authtime: Option<KdcTime>,
    starttime: Option<KdcTime>,
    endtime: Option<KdcTime>,
    renew_till: Option<KdcTime>,
    caddr: Option<HostAddresses>,
    authorization_data: Option<AuthorizationData>,
}

impl EncTicketPartBuilder {
    pub fn new(cname: PrincipalName, crealm: Realm) -> Self {
        return Self {
            flags: TicketFlagSet::new(),
            key: None,
            crealm,
            cname,
            transited: TransitedEncoding::default(),
            authtime: None,
            starttime: None,
            endtime: None,
            renew_till: None,
            caddr: None,
            authorization_data: None,
        };
    }

    pub fn set_flag(&mut self, flag: u32) {
        self.flags.set(flag);
    }

    pub fn clear_flag(&mut self, flag: u32) {
        self.flags.clear(flag);
    }

    pub fn flags(&self) -> TicketFlagSet {
        return self.flags;
    }

    pub fn set_session_key(&mut self, key: EncryptionKey) {
        self.key = Some(key);
    }

    pub fn set_client_addresses(&mut self, caddr: Option<HostAddresses>) {
        self.caddr = caddr;
    }

    pub fn set_authorization_data(
        &mut self,
        authorization_data: Option<AuthorizationData>,
    ) {
        self.authorization_data = authorization_data;
    }

    pub fn set_transited(&mut self, transited: TransitedEncoding) {
        self.transited = transited;
    }

    pub fn set_auth_time(&mut self, authtime: KdcTime) {
        self.authtime = Some(authtime);
    }

    pub fn set_start_time(&mut self, starttime: Option<KdcTime>) {
        self.starttime = starttime;
    }

    pub fn start_time(&self) -> Option<KdcTime> {
        return self.starttime;
    }

    pub fn set_end_time(&mut self, endtime: KdcTime) {
        self.endtime = Some(endtime);
    }

    pub fn set_renew_till(&mut self, renew_till: Option<KdcTime>) {
        self.renew_till = renew_till;
    }

    /// Copies the presented ticket's body wholesale; RENEW and VALIDATE
    /// issue a ticket that echoes the old one before adjusting it.
    pub fn echo(&mut self, part: &EncTicketPart) {
        self.flags = TicketFlagSet::from_bits(part.flags.flags);
        self.key = Some(part.key.clone());
        self.crealm = part.crealm.clone();
        self.cname = part.cname.clone();
        self.transited = part.transited.clone();
        self.authtime = Some(KdcTime::from(&part.authtime));
        self.starttime = part.starttime.as_ref().map(KdcTime::from);
        self.endtime = Some(KdcTime::from(&part.endtime));
        self.renew_till = part.renew_till.as_ref().map(KdcTime::from);
        self.caddr = part.caddr.clone();
        self.authorization_data = part.authorization_data.clone();
    }

    pub fn build(self) -> Result<EncTicketPart> {
        let key = self
            .key
            .ok_or_else(|| KerberosError::generic("session key not set"))?;
        let authtime = self
            .authtime
            .ok_or_else(|| KerberosError::generic("auth time not set"))?;
        let endtime = self
            .endtime
            .ok_or_else(|| KerberosError::generic("end time not set"))?;

        return Ok(EncTicketPart {
            flags: self.flags.bits().into(),
            key,
            crealm: self.crealm,
            cname: self.cname,
            transited: self.transited,
            authtime: authtime.to_kerberos_time(),
            starttime: self.starttime.map(|time| time.to_kerberos_time()),
            endtime: endtime.to_kerberos_time(),
            renew_till: self.renew_till.map(|time| time.to_kerberos_time()),
            caddr: self.caddr,
            authorization_data: self.authorization_data,
        });
    }
}
