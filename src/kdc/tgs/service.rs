use super::context::TicketGrantingContext;
use super::ticket::EncTicketPartBuilder;
use crate::error::{KerberosError, Result};
use crate::kdc::config::KdcConfig;
use crate::kdc::crypto::random_key;
use crate::kdc::flags::{KdcOptionSet, TicketFlagSet};
use crate::kdc::principal::KrbPrincipal;
use crate::kdc::replay::AuthenticatorIdentity;
use crate::kdc::store::get_entry;
use crate::kdc::time::KdcTime;
use kerberos_asn1::{
    ApReq, Asn1Object, Authenticator, AuthorizationData, EncTgsRepPart,
    EncTicketPart, HostAddress, HostAddresses, PrincipalName, TgsRep, Ticket,
};
use kerberos_constants::key_usages::{
    KEY_USAGE_AS_REP_TICKET, KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY,
    KEY_USAGE_TGS_REQ_AUTHEN,
};
use kerberos_constants::{
    error_codes, kdc_options, pa_data_types, ticket_flags,
};
use log::{debug, log_enabled, Level};
use std::net::IpAddr;

/// Authorization data in a TGS-REQ is sealed at usage 4, with the
/// authenticator subkey when the client supplied one.
const KEY_USAGE_TGS_REQ_AUTH_DATA: i32 = 4;

/// The req-body checksum and the reply to a subkey-less client are both
/// keyed at usage 8; deployed clients depend on these exact values.
const KEY_USAGE_TGS_BODY_CKSUM: i32 = 8;

/// Reply sealed under the authenticator subkey.
const KEY_USAGE_TGS_REP_SUBKEY: i32 = 9;

/// The only transited encoding this KDC recognizes.
const TR_DOMAIN_X500_COMPRESS: i32 = 1;

const ADDR_TYPE_IPV4: i32 = 2;
const ADDR_TYPE_IPV6: i32 = 24;

/// Runs the Ticket-Granting Service over a decoded TGS-REQ. On success
/// the context carries the TGS-REP; the first failing stage aborts the
/// pipeline and its error becomes the answer. Nothing is retried, and
/// only the replay cache insertion outlives a failed request.
pub fn execute(ctx: &mut TicketGrantingContext) -> Result<()> {
    if log_enabled!(Level::Debug) {
        monitor_request(ctx);
    }

    configure_ticket_granting(ctx)?;
    select_encryption_type(ctx)?;
    get_auth_header(ctx)?;
    verify_tgt(ctx)?;
    get_ticket_principal_entry(ctx)?;
    verify_tgt_auth_header(ctx)?;
    verify_body_checksum(ctx)?;
    get_request_principal_entry(ctx)?;
    generate_ticket(ctx)?;
    build_reply(ctx)?;

    if log_enabled!(Level::Debug) {
        monitor_reply(ctx);
    }

    return Ok(());
}

fn configure_ticket_granting(ctx: &TicketGrantingContext) -> Result<()> {
    if ctx.request.pvno != 5 {
        return Err(KerberosError::new(error_codes::KDC_ERR_BAD_PVNO));
    }
    return Ok(());
}

fn select_encryption_type(ctx: &mut TicketGrantingContext) -> Result<()> {
    let requested = &ctx.request.req_body.etypes;

    let best = ctx
        .config
        .encryption_types
        .iter()
        .copied()
        .find(|etype| requested.contains(etype));

    match best {
        Some(etype) => {
            debug!("Session will use encryption type {}", etype);
            ctx.encryption_type = Some(etype);
            return Ok(());
        }
        None => {
            return Err(KerberosError::new(
                error_codes::KDC_ERR_ETYPE_NOSUPP,
            ));
        }
    }
}

fn get_auth_header(ctx: &mut TicketGrantingContext) -> Result<()> {
    let padata = ctx.request.padata.as_ref().ok_or_else(|| {
        KerberosError::new(error_codes::KDC_ERR_PADATA_TYPE_NOSUPP)
    })?;

    let pa_tgs_req = padata
        .iter()
        .find(|pa| pa.padata_type == pa_data_types::PA_TGS_REQ)
        .ok_or_else(|| {
            KerberosError::new(error_codes::KDC_ERR_PADATA_TYPE_NOSUPP)
        })?;

    let (_, ap_req) =
        ApReq::parse(&pa_tgs_req.padata_value).map_err(|_| {
            KerberosError::with_text(
                error_codes::KRB_AP_ERR_MODIFIED,
                "unparseable PA-TGS-REQ value",
            )
        })?;

    ctx.tgt = Some(ap_req.ticket.clone());
    ctx.tgt_body = Some(super::ticket::TicketBody::Sealed(
        ap_req.ticket.enc_part.clone(),
    ));
    ctx.auth_header = Some(ap_req);
    return Ok(());
}

/// Only the KDC's own TGT, or a second ticket naming the requested
/// server itself, may drive this service.
fn verify_tgt(ctx: &TicketGrantingContext) -> Result<()> {
    let tgt = ctx.tgt()?;

    if tgt.realm != ctx.config.primary_realm {
        return Err(KerberosError::new(error_codes::KRB_AP_ERR_NOT_US));
    }

    let tgt_server_name = tgt.sname.name_string.join("/");
    let service_name = ctx.config.service_principal.name_string();
    let request_server_name = match &ctx.request.req_body.sname {
        Some(sname) => sname.name_string.join("/"),
        None => String::new(),
    };

    if tgt_server_name != service_name
        && tgt_server_name != request_server_name
    {
        return Err(KerberosError::new(error_codes::KRB_AP_ERR_NOT_US));
    }

    return Ok(());
}

fn get_ticket_principal_entry(ctx: &mut TicketGrantingContext) -> Result<()> {
    let tgt = ctx.tgt()?;
    let principal =
        KrbPrincipal::new(tgt.sname.clone(), tgt.realm.clone());

    let entry = get_entry(
        ctx.store.as_ref(),
        &principal,
        error_codes::KDC_ERR_S_PRINCIPAL_UNKNOWN,
    )?;

    ctx.ticket_principal_entry = Some(entry);
    return Ok(());
}

fn verify_tgt_auth_header(ctx: &mut TicketGrantingContext) -> Result<()> {
    let is_validate = ctx.options().is_set(kdc_options::VALIDATE);
    let skew = ctx.config.allowable_clock_skew;
    let now = ctx.now;

    let tgt_etype = ctx.tgt()?.enc_part.etype;
    let server_key = ctx
        .ticket_entry()?
        .key_for(tgt_etype)
        .ok_or_else(|| {
            KerberosError::with_text(
                error_codes::KDC_ERR_ETYPE_NOSUPP,
                format!("no server key for ticket etype {}", tgt_etype),
            )
        })?
        .clone();

    let tgt_body = ctx.take_tgt_body()?.unseal(
        &ctx.cipher_text_handler,
        &server_key,
        KEY_USAGE_AS_REP_TICKET,
    )?;
    ctx.tgt_body = Some(tgt_body);
    let tgt_part = ctx.tgt_part()?.clone();

    let sealed_authenticator = ctx.auth_header()?.authenticator.clone();
    let plain = ctx.cipher_text_handler.unseal(
        &tgt_part.key,
        &sealed_authenticator,
        KEY_USAGE_TGS_REQ_AUTHEN,
    )?;
    let (_, authenticator) = Authenticator::parse(&plain).map_err(|_| {
        KerberosError::with_text(
            error_codes::KRB_AP_ERR_MODIFIED,
            "unparseable authenticator",
        )
    })?;

    if authenticator.cname.name_string != tgt_part.cname.name_string
        || authenticator.crealm != tgt_part.crealm
    {
        return Err(KerberosError::new(error_codes::KRB_AP_ERR_BADMATCH));
    }

    let ctime = KdcTime::from(&authenticator.ctime);
    if !ctime.is_in_clock_skew(now, skew) {
        return Err(KerberosError::new(error_codes::KRB_AP_ERR_SKEW));
    }

    let identity = AuthenticatorIdentity {
        cname: authenticator.cname.name_string.join("/"),
        crealm: authenticator.crealm.clone(),
        ctime,
        cusec: authenticator.cusec as _,
    };
    if !ctx.replay_cache.check_and_insert(identity) {
        return Err(KerberosError::new(error_codes::KRB_AP_ERR_REPEAT));
    }

    if let Some(sender) = ctx.client_address {
        match &tgt_part.caddr {
            Some(caddr) if !caddr.is_empty() => {
                if !caddr.contains(&host_address(sender)) {
                    return Err(KerberosError::new(
                        error_codes::KRB_AP_ERR_BADADDR,
                    ));
                }
            }
            _ => {
                if !ctx.config.empty_addresses_allowed {
                    return Err(KerberosError::new(
                        error_codes::KRB_AP_ERR_BADADDR,
                    ));
                }
            }
        }
    }

    // A VALIDATE request presents a ticket that is not yet valid on
    // purpose; its lifetime is judged by the validate path instead.
    if !is_validate {
        let tgt_flags = TicketFlagSet::from_bits(tgt_part.flags.flags);
        if tgt_flags.is_set(ticket_flags::INVALID) {
            return Err(KerberosError::new(
                error_codes::KRB_AP_ERR_TKT_NYV,
            ));
        }

        let start = tgt_part
            .starttime
            .as_ref()
            .map(KdcTime::from)
            .unwrap_or_else(|| KdcTime::from(&tgt_part.authtime));
        if start > now && !start.is_in_clock_skew(now, skew) {
            return Err(KerberosError::new(
                error_codes::KRB_AP_ERR_TKT_NYV,
            ));
        }

        let end = KdcTime::from(&tgt_part.endtime);
        if end < now && !end.is_in_clock_skew(now, skew) {
            return Err(KerberosError::new(
                error_codes::KRB_AP_ERR_TKT_EXPIRED,
            ));
        }
    }

    ctx.authenticator = Some(authenticator);
    return Ok(());
}

fn verify_body_checksum(ctx: &TicketGrantingContext) -> Result<()> {
    if !ctx.config.body_checksum_verified {
        return Ok(());
    }

    let authenticator = ctx.authenticator()?;
    let cksum = authenticator.cksum.as_ref().ok_or_else(|| {
        KerberosError::new(error_codes::KRB_AP_ERR_INAPP_CKSUM)
    })?;
    if cksum.checksum.is_empty() {
        return Err(KerberosError::new(
            error_codes::KRB_AP_ERR_INAPP_CKSUM,
        ));
    }
    let body_bytes = ctx.body_bytes.as_ref().ok_or_else(|| {
        KerberosError::new(error_codes::KRB_AP_ERR_INAPP_CKSUM)
    })?;

    debug!("Verifying body checksum type {}", cksum.cksumtype);

    let session_key = &ctx.tgt_part()?.key;
    return ctx.checksum_handler.verify_checksum(
        cksum,
        body_bytes,
        session_key,
        KEY_USAGE_TGS_BODY_CKSUM,
    );
}

fn get_request_principal_entry(
    ctx: &mut TicketGrantingContext,
) -> Result<()> {
    let principal = request_server_principal(ctx)?;

    let entry = get_entry(
        ctx.store.as_ref(),
        &principal,
        error_codes::KDC_ERR_S_PRINCIPAL_UNKNOWN,
    )?;

    ctx.request_principal_entry = Some(entry);
    return Ok(());
}

fn generate_ticket(ctx: &mut TicketGrantingContext) -> Result<()> {
    let mut options = ctx.options();

    if options.is_set(kdc_options::ENC_TKT_IN_SKEY) {
        return Err(KerberosError::with_text(
            error_codes::KDC_ERR_BADOPTION,
            "user-to-user tickets are not supported",
        ));
    }
    // RFC 4120 treats VALIDATE and RENEW as mutually exclusive.
    if options.is_set(kdc_options::VALIDATE)
        && options.is_set(kdc_options::RENEW)
    {
        return Err(KerberosError::new(error_codes::KDC_ERR_BADOPTION));
    }

    let config = ctx.config.clone();
    let now = ctx.now;
    let tgt_part = ctx.tgt_part()?.clone();
    let request_from =
        ctx.request.req_body.from.as_ref().map(KdcTime::from);
    let request_till = KdcTime::from(&ctx.request.req_body.till);
    let request_rtime =
        ctx.request.req_body.rtime.as_ref().map(KdcTime::from);
    let request_addresses = ctx.request.req_body.addresses.clone();

    let mut builder = EncTicketPartBuilder::new(
        tgt_part.cname.clone(),
        tgt_part.crealm.clone(),
    );
    builder.set_client_addresses(tgt_part.caddr.clone());

    process_flags(
        &config,
        options,
        request_from,
        request_addresses.as_ref(),
        now,
        &tgt_part,
        &mut builder,
    )?;

    let etype = ctx.selected_etype()?;
    builder.set_session_key(random_key(etype)?);

    if let Some(enc_auth_data) =
        ctx.request.req_body.enc_authorization_data.clone()
    {
        let sealing_key = match &ctx.authenticator()?.subkey {
            Some(subkey) => subkey.clone(),
            None => tgt_part.key.clone(),
        };
        let plain = ctx.cipher_text_handler.unseal(
            &sealing_key,
            &enc_auth_data,
            KEY_USAGE_TGS_REQ_AUTH_DATA,
        )?;
        let (_, mut auth_data) =
            AuthorizationData::parse(&plain).map_err(|_| {
                KerberosError::with_text(
                    error_codes::KRB_AP_ERR_MODIFIED,
                    "unparseable enc-authorization-data",
                )
            })?;
        if let Some(tgt_auth_data) = &tgt_part.authorization_data {
            auth_data.extend(tgt_auth_data.iter().cloned());
        }
        builder.set_authorization_data(Some(auth_data));
    }

    process_transited(&tgt_part, &mut builder)?;

    process_times(
        &config,
        &mut options,
        request_from,
        request_till,
        request_rtime,
        now,
        &tgt_part,
        &mut builder,
    )?;

    let ticket_part = builder.build()?;

    let server_key = ctx
        .request_entry()?
        .key_for(etype)
        .ok_or_else(|| {
            KerberosError::with_text(
                error_codes::KDC_ERR_ETYPE_NOSUPP,
                format!("no server key for etype {}", etype),
            )
        })?
        .clone();

    let sealed = ctx.cipher_text_handler.seal(
        &server_key,
        &ticket_part.build(),
        KEY_USAGE_AS_REP_TICKET,
    )?;

    let principal = request_server_principal(ctx)?;
    ctx.new_ticket = Some(Ticket {
        tkt_vno: 5,
        realm: principal.realm().to_string(),
        sname: principal.name().clone(),
        enc_part: sealed,
    });
    ctx.new_ticket_part = Some(ticket_part);
    return Ok(());
}

fn build_reply(ctx: &mut TicketGrantingContext) -> Result<()> {
    let tgt_part = ctx.tgt_part()?.clone();
    let new_ticket = ctx.new_ticket()?.clone();
    let new_part = ctx.new_ticket_part()?.clone();

    let mut enc_kdc_rep_part = EncTgsRepPart::default();
    enc_kdc_rep_part.key = new_part.key.clone();
    enc_kdc_rep_part.nonce = ctx.request.req_body.nonce;
    enc_kdc_rep_part.flags = new_part.flags.clone();
    enc_kdc_rep_part.authtime = new_part.authtime.clone();
    enc_kdc_rep_part.starttime = new_part.starttime.clone();
    enc_kdc_rep_part.endtime = new_part.endtime.clone();
    if TicketFlagSet::from_bits(new_part.flags.flags)
        .is_set(ticket_flags::RENEWABLE)
    {
        enc_kdc_rep_part.renew_till = new_part.renew_till.clone();
    }
    enc_kdc_rep_part.srealm = new_ticket.realm.clone();
    enc_kdc_rep_part.sname = new_ticket.sname.clone();
    enc_kdc_rep_part.caddr = new_part.caddr.clone();

    let raw_enc_part = enc_kdc_rep_part.build();
    let authenticator = ctx.authenticator()?;
    let sealed = match &authenticator.subkey {
        Some(subkey) => ctx.cipher_text_handler.seal(
            subkey,
            &raw_enc_part,
            KEY_USAGE_TGS_REP_SUBKEY,
        )?,
        None => ctx.cipher_text_handler.seal(
            &tgt_part.key,
            &raw_enc_part,
            KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY,
        )?,
    };

    let mut reply = TgsRep::default();
    reply.pvno = 5;
    reply.msg_type = 13;
    reply.crealm = tgt_part.crealm.clone();
    reply.cname = tgt_part.cname.clone();
    reply.ticket = new_ticket;
    reply.enc_part = sealed;

    ctx.reply = Some(reply);
    return Ok(());
}

/// One row per KDC option the flag algebra honors: the policy class
/// that must allow it, the TGT capability it requires, the flag it sets
/// on the new ticket, and whether it copies request addresses.
struct OptionRule {
    option: u32,
    policy: OptionClass,
    required_tgt_flag: u32,
    resulting_flag: u32,
    copies_addresses: bool,
}

#[derive(Clone, Copy)]
enum OptionClass {
    Forwardable,
    Proxiable,
    Postdated,
}

impl OptionClass {
    fn allowed(self, config: &KdcConfig) -> bool {
        match self {
            OptionClass::Forwardable => config.forwardable_allowed,
            OptionClass::Proxiable => config.proxiable_allowed,
            OptionClass::Postdated => config.postdated_allowed,
        }
    }
}

const OPTION_RULES: [OptionRule; 6] = [
    OptionRule {
        option: kdc_options::FORWARDABLE,
        policy: OptionClass::Forwardable,
        required_tgt_flag: ticket_flags::FORWARDABLE,
        resulting_flag: ticket_flags::FORWARDABLE,
        copies_addresses: false,
    },
    OptionRule {
        option: kdc_options::FORWARDED,
        policy: OptionClass::Forwardable,
        required_tgt_flag: ticket_flags::FORWARDABLE,
        resulting_flag: ticket_flags::FORWARDED,
        copies_addresses: true,
    },
    OptionRule {
        option: kdc_options::PROXIABLE,
        policy: OptionClass::Proxiable,
        required_tgt_flag: ticket_flags::PROXIABLE,
        resulting_flag: ticket_flags::PROXIABLE,
        copies_addresses: false,
    },
    OptionRule {
        option: kdc_options::PROXY,
        policy: OptionClass::Proxiable,
        required_tgt_flag: ticket_flags::PROXIABLE,
        resulting_flag: ticket_flags::PROXY,
        copies_addresses: true,
    },
    OptionRule {
        option: kdc_options::ALLOW_POSTDATE,
        policy: OptionClass::Postdated,
        required_tgt_flag: ticket_flags::MAY_POSTDATE,
        resulting_flag: ticket_flags::MAY_POSTDATE,
        copies_addresses: false,
    },
    OptionRule {
        option: kdc_options::POSTDATED,
        policy: OptionClass::Postdated,
        required_tgt_flag: ticket_flags::MAY_POSTDATE,
        resulting_flag: ticket_flags::POSTDATE,
        copies_addresses: false,
    },
];

fn process_flags(
    config: &KdcConfig,
    options: KdcOptionSet,
    request_from: Option<KdcTime>,
    request_addresses: Option<&HostAddresses>,
    now: KdcTime,
    tgt_part: &EncTicketPart,
    builder: &mut EncTicketPartBuilder,
) -> Result<()> {
    let tgt_flags = TicketFlagSet::from_bits(tgt_part.flags.flags);

    if tgt_flags.is_set(ticket_flags::PRE_AUTHENT) {
        builder.set_flag(ticket_flags::PRE_AUTHENT);
    }

    for rule in OPTION_RULES.iter() {
        if !options.is_set(rule.option) {
            continue;
        }
        if !rule.policy.allowed(config) {
            return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
        }
        if !tgt_flags.is_set(rule.required_tgt_flag) {
            return Err(KerberosError::new(error_codes::KDC_ERR_BADOPTION));
        }
        if rule.copies_addresses {
            match request_addresses {
                Some(addresses) if !addresses.is_empty() => {
                    builder.set_client_addresses(Some(addresses.clone()));
                }
                _ => {
                    if !config.empty_addresses_allowed {
                        return Err(KerberosError::new(
                            error_codes::KDC_ERR_POLICY,
                        ));
                    }
                }
            }
        }
        builder.set_flag(rule.resulting_flag);

        if rule.option == kdc_options::POSTDATED {
            // A postdated ticket starts invalid and must be validated
            // once its start time has been reached.
            builder.set_flag(ticket_flags::INVALID);
            builder.set_start_time(request_from);
        }
    }

    if tgt_flags.is_set(ticket_flags::FORWARDED) {
        builder.set_flag(ticket_flags::FORWARDED);
    }

    if options.is_set(kdc_options::VALIDATE) {
        if !config.postdated_allowed {
            return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
        }
        if !tgt_flags.is_set(ticket_flags::INVALID) {
            return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
        }

        let start = tgt_part
            .starttime
            .as_ref()
            .map(KdcTime::from)
            .unwrap_or_else(|| KdcTime::from(&tgt_part.authtime));
        if start > now {
            return Err(KerberosError::new(
                error_codes::KRB_AP_ERR_TKT_NYV,
            ));
        }

        builder.echo(tgt_part);
        builder.clear_flag(ticket_flags::INVALID);
    }

    if options.any_reserved() {
        return Err(KerberosError::new(error_codes::KDC_ERR_BADOPTION));
    }

    return Ok(());
}

fn process_transited(
    tgt_part: &EncTicketPart,
    builder: &mut EncTicketPartBuilder,
) -> Result<()> {
    // Stage 4 already pinned the TGT to the local realm, so the
    // transited path is carried over unchanged; a foreign encoding
    // would have to be recognized before it could be compressed.
    let transited = &tgt_part.transited;
    if !transited.contents.is_empty()
        && transited.tr_type != TR_DOMAIN_X500_COMPRESS
    {
        return Err(KerberosError::new(error_codes::KDC_ERR_TRTYPE_NOSUPP));
    }

    builder.set_transited(transited.clone());
    return Ok(());
}

fn process_times(
    config: &KdcConfig,
    options: &mut KdcOptionSet,
    request_from: Option<KdcTime>,
    request_till: KdcTime,
    request_rtime: Option<KdcTime>,
    now: KdcTime,
    tgt_part: &EncTicketPart,
    builder: &mut EncTicketPartBuilder,
) -> Result<()> {
    let skew = config.allowable_clock_skew;
    let tgt_flags = TicketFlagSet::from_bits(tgt_part.flags.flags);
    let postdated = options.is_set(kdc_options::POSTDATED);

    builder.set_auth_time(KdcTime::from(&tgt_part.authtime));

    let tgt_start = tgt_part
        .starttime
        .as_ref()
        .map(KdcTime::from)
        .unwrap_or_else(|| KdcTime::from(&tgt_part.authtime));
    let tgt_end = KdcTime::from(&tgt_part.endtime);
    let tgt_renew_till = tgt_part
        .renew_till
        .as_ref()
        .map(KdcTime::from)
        .unwrap_or(KdcTime::INFINITY);

    // An absent or past start time, or one inside the skew window of a
    // request that is not postdating, collapses to the server's now.
    let start_time = match request_from {
        None => now,
        Some(from) => {
            if from < now || (from.is_in_clock_skew(now, skew) && !postdated)
            {
                now
            } else {
                from
            }
        }
    };

    if start_time > now
        && !start_time.is_in_clock_skew(now, skew)
        && (!postdated || !tgt_flags.is_set(ticket_flags::MAY_POSTDATE))
    {
        return Err(KerberosError::new(
            error_codes::KDC_ERR_CANNOT_POSTDATE,
        ));
    }

    let mut renewal_time: Option<KdcTime> = None;
    let end_time: KdcTime;

    if options.is_set(kdc_options::RENEW) {
        if !config.renewable_allowed {
            return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
        }
        if !tgt_flags.is_set(ticket_flags::RENEWABLE) {
            return Err(KerberosError::new(error_codes::KDC_ERR_BADOPTION));
        }
        if tgt_renew_till < now {
            return Err(KerberosError::new(
                error_codes::KRB_AP_ERR_TKT_EXPIRED,
            ));
        }

        builder.echo(tgt_part);
        builder.set_start_time(Some(now));

        let old_life = tgt_end.since(tgt_start);
        end_time = tgt_renew_till.min(now.plus(old_life));
        builder.set_end_time(end_time);
    } else {
        if builder.start_time().is_none() {
            builder.set_start_time(Some(now));
        }

        let till = if request_till.is_zero() {
            KdcTime::INFINITY
        } else {
            request_till
        };

        // The end time is the minimum of the requested till time, the
        // start time plus the configured maximum lifetime, and the end
        // time of the TGT.
        end_time = till
            .min(start_time.plus(config.maximum_ticket_lifetime))
            .min(tgt_end);
        builder.set_end_time(end_time);

        if options.is_set(kdc_options::RENEWABLE_OK)
            && end_time < request_till
            && tgt_flags.is_set(ticket_flags::RENEWABLE)
        {
            if !config.renewable_allowed {
                return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
            }

            // The client accepts a renewable ticket in place of the
            // lifetime it could not get outright.
            options.set(kdc_options::RENEWABLE);
            renewal_time = Some(request_till.min(tgt_renew_till));
        }
    }

    let renewal_time = renewal_time.or(request_rtime);
    let rtime = renewal_time.map(|time| {
        if time.is_zero() {
            KdcTime::INFINITY
        } else {
            time
        }
    });

    if options.is_set(kdc_options::RENEWABLE)
        && tgt_flags.is_set(ticket_flags::RENEWABLE)
    {
        if !config.renewable_allowed {
            return Err(KerberosError::new(error_codes::KDC_ERR_POLICY));
        }

        builder.set_flag(ticket_flags::RENEWABLE);

        let mut renew_till = start_time
            .plus(config.maximum_renewable_lifetime)
            .min(tgt_renew_till);
        if let Some(rtime) = rtime {
            renew_till = renew_till.min(rtime);
        }
        builder.set_renew_till(Some(renew_till));
    }

    if end_time < start_time {
        return Err(KerberosError::new(error_codes::KDC_ERR_NEVER_VALID));
    }
    if end_time.since(start_time) < skew {
        return Err(KerberosError::new(error_codes::KDC_ERR_NEVER_VALID));
    }

    return Ok(());
}

fn request_server_principal(
    ctx: &TicketGrantingContext,
) -> Result<KrbPrincipal> {
    let sname = ctx.request.req_body.sname.clone().ok_or_else(|| {
        KerberosError::new(error_codes::KDC_ERR_S_PRINCIPAL_UNKNOWN)
    })?;
    return Ok(KrbPrincipal::new(
        sname,
        ctx.request.req_body.realm.clone(),
    ));
}

fn host_address(address: IpAddr) -> HostAddress {
    match address {
        IpAddr::V4(v4) => {
            return HostAddress {
                addr_type: ADDR_TYPE_IPV4,
                address: v4.octets().to_vec(),
            };
        }
        IpAddr::V6(v6) => {
            return HostAddress {
                addr_type: ADDR_TYPE_IPV6,
                address: v6.octets().to_vec(),
            };
        }
    }
}

fn principal_name_string(name: Option<&PrincipalName>) -> String {
    return name
        .map(|name| name.name_string.join("/"))
        .unwrap_or_else(|| "-".to_string());
}

fn monitor_request(ctx: &TicketGrantingContext) {
    let body = &ctx.request.req_body;
    debug!(
        "Received TGS request: pvno {} nonce {} options {} cname {} \
         sname {} realm {} etypes {:?} till {} rtime {}",
        ctx.request.pvno,
        body.nonce,
        ctx.options(),
        principal_name_string(body.cname.as_ref()),
        principal_name_string(body.sname.as_ref()),
        body.realm,
        body.etypes,
        KdcTime::from(&body.till),
        body.rtime
            .as_ref()
            .map(|time| KdcTime::from(time).to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
}

fn monitor_reply(ctx: &TicketGrantingContext) {
    if let (Ok(ticket), Ok(part)) = (ctx.new_ticket(), ctx.new_ticket_part())
    {
        debug!(
            "Responding with TGS reply: sname {} flags {} authtime {} \
             endtime {} renew-till {}",
            principal_name_string(Some(&ticket.sname)),
            TicketFlagSet::from_bits(part.flags.flags),
            KdcTime::from(&part.authtime),
            KdcTime::from(&part.endtime),
            part.renew_till
                .as_ref()
                .map(|time| KdcTime::from(time).to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdc::crypto::random_key;
    use kerberos_constants::etypes;
    use kerberos_constants::principal_names::NT_PRINCIPAL;

    const MINUTE: i64 = 60 * 1000;
    const HOUR: i64 = 60 * MINUTE;

    fn alice() -> PrincipalName {
        return PrincipalName {
            name_type: NT_PRINCIPAL,
            name_string: vec!["alice".to_string()],
        };
    }

    fn tgt_part(flag_bits: u32, now: KdcTime) -> EncTicketPart {
        let mut builder =
            EncTicketPartBuilder::new(alice(), "EXAMPLE.COM".to_string());
        builder.set_session_key(
            random_key(etypes::AES256_CTS_HMAC_SHA1_96).unwrap(),
        );
        builder.set_auth_time(now.plus(-HOUR));
        builder.set_start_time(Some(now.plus(-HOUR)));
        builder.set_end_time(now.plus(12 * HOUR));
        builder.set_renew_till(Some(now.plus(7 * 24 * HOUR)));
        builder.set_flag(flag_bits);
        return builder.build().unwrap();
    }

    fn new_builder() -> EncTicketPartBuilder {
        return EncTicketPartBuilder::new(alice(), "EXAMPLE.COM".to_string());
    }

    #[test]
    fn test_option_without_tgt_capability_is_bad_option() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(0, now);
        let mut builder = new_builder();

        let error = process_flags(
            &config,
            KdcOptionSet::from_bits(kdc_options::FORWARDABLE),
            None,
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap_err();

        assert_eq!(error_codes::KDC_ERR_BADOPTION, error.error_code());
    }

    #[test]
    fn test_option_against_policy_is_policy_error() {
        let mut config = KdcConfig::new("EXAMPLE.COM");
        config.forwardable_allowed = false;
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(ticket_flags::FORWARDABLE, now);
        let mut builder = new_builder();

        let error = process_flags(
            &config,
            KdcOptionSet::from_bits(kdc_options::FORWARDABLE),
            None,
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap_err();

        assert_eq!(error_codes::KDC_ERR_POLICY, error.error_code());
    }

    #[test]
    fn test_forwarded_flag_is_inherited_from_tgt() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(ticket_flags::FORWARDED, now);
        let mut builder = new_builder();

        process_flags(
            &config,
            KdcOptionSet::from_bits(0),
            None,
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap();

        assert!(builder.flags().is_set(ticket_flags::FORWARDED));
    }

    #[test]
    fn test_reserved_option_is_rejected() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(ticket_flags::FORWARDABLE, now);
        let mut builder = new_builder();

        let error = process_flags(
            &config,
            KdcOptionSet::from_bits(0x8000_0000),
            None,
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap_err();

        assert_eq!(error_codes::KDC_ERR_BADOPTION, error.error_code());
    }

    #[test]
    fn test_postdated_sets_invalid_and_start_time() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let from = now.plus(2 * HOUR);
        let tgt = tgt_part(ticket_flags::MAY_POSTDATE, now);
        let mut builder = new_builder();

        process_flags(
            &config,
            KdcOptionSet::from_bits(kdc_options::POSTDATED),
            Some(from),
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap();

        assert!(builder.flags().is_set(ticket_flags::POSTDATE));
        assert!(builder.flags().is_set(ticket_flags::INVALID));
        assert_eq!(Some(from), builder.start_time());
    }

    #[test]
    fn test_end_time_is_capped_by_policy_tgt_and_till() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(0, now);
        let mut builder = new_builder();
        let mut options = KdcOptionSet::from_bits(0);

        process_times(
            &config,
            &mut options,
            None,
            now.plus(10 * HOUR),
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap();

        let part = finish(builder);
        // 10h requested, 24h policy, TGT good for 12h more: till wins.
        assert_eq!(
            now.plus(10 * HOUR),
            KdcTime::from(&part.endtime)
        );
    }

    #[test]
    fn test_zero_till_is_treated_as_infinity() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(0, now);
        let mut builder = new_builder();
        let mut options = KdcOptionSet::from_bits(0);

        process_times(
            &config,
            &mut options,
            None,
            KdcTime::from_millis(0),
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap();

        // No client bound: only the policy and TGT caps remain, and the
        // TGT end (12h away) is the tighter of the two.
        let part = finish(builder);
        assert_eq!(now.plus(12 * HOUR), KdcTime::from(&part.endtime));
    }

    #[test]
    fn test_renewable_ok_upgrades_to_renewable() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(ticket_flags::RENEWABLE, now);
        let mut builder = new_builder();
        let mut options = KdcOptionSet::from_bits(kdc_options::RENEWABLE_OK);

        process_times(
            &config,
            &mut options,
            None,
            now.plus(48 * HOUR),
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap();

        assert!(options.is_set(kdc_options::RENEWABLE));
        assert!(builder.flags().is_set(ticket_flags::RENEWABLE));
    }

    #[test]
    fn test_lifetime_shorter_than_skew_never_valid() {
        let config = KdcConfig::new("EXAMPLE.COM");
        let now = KdcTime::from_millis(1_600_000_000_000);
        let tgt = tgt_part(0, now);
        let mut builder = new_builder();
        let mut options = KdcOptionSet::from_bits(0);

        let error = process_times(
            &config,
            &mut options,
            None,
            now.plus(MINUTE),
            None,
            now,
            &tgt,
            &mut builder,
        )
        .unwrap_err();

        assert_eq!(error_codes::KDC_ERR_NEVER_VALID, error.error_code());
    }

    fn finish(mut builder: EncTicketPartBuilder) -> EncTicketPart {
        builder.set_session_key(
            random_key(etypes::AES128_CTS_HMAC_SHA1_96).unwrap(),
        );
        return builder.build().unwrap();
    }
}
