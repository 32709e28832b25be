use kerberos_constants::{kdc_options, ticket_flags};
use std::fmt;

/// Flag bits reserved by RFC 4120 (0, 7, 9-25, 29). A TGS request setting
/// any of them is refused with KDC_ERR_BADOPTION.
pub const RESERVED_KDC_OPTIONS: u32 = 0x817f_ffc4;

/// The flag set of a ticket under construction. Bits are the wire bits of
/// `kerberos_constants::ticket_flags`; each flag is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFlagSet {
    bits: u32,
}

impl TicketFlagSet {
    pub fn new() -> Self {
        return Self { bits: 0 };
    }

    pub fn from_bits(bits: u32) -> Self {
        return Self { bits };
    }

    pub fn bits(&self) -> u32 {
        return self.bits;
    }

    pub fn set(&mut self, flag: u32) {
        self.bits |= flag;
    }

    pub fn clear(&mut self, flag: u32) {
        self.bits &= !flag;
    }

    pub fn is_set(&self, flag: u32) -> bool {
        return (self.bits & flag) != 0;
    }
}

impl fmt::Display for TicketFlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (ticket_flags::FORWARDABLE, "forwardable"),
            (ticket_flags::FORWARDED, "forwarded"),
            (ticket_flags::PROXIABLE, "proxiable"),
            (ticket_flags::PROXY, "proxy"),
            (ticket_flags::MAY_POSTDATE, "may_postdate"),
            (ticket_flags::POSTDATE, "postdate"),
            (ticket_flags::INVALID, "invalid"),
            (ticket_flags::RENEWABLE, "renewable"),
            (ticket_flags::INITIAL, "initial"),
            (ticket_flags::PRE_AUTHENT, "pre_authent"),
            (ticket_flags::HW_AUTHENT, "hw_authent"),
        ];

        let mut flags_strs = Vec::new();
        for &(flag, name) in names.iter() {
            if self.is_set(flag) {
                flags_strs.push(name);
            }
        }

        return write!(f, "{:#010x} -> {}", self.bits, flags_strs.join(" "));
    }
}

/// The option set of a KDC request, over the wire bits of
/// `kerberos_constants::kdc_options`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdcOptionSet {
    bits: u32,
}

impl KdcOptionSet {
    pub fn from_bits(bits: u32) -> Self {
        return Self { bits };
    }

    pub fn bits(&self) -> u32 {
        return self.bits;
    }

    pub fn is_set(&self, option: u32) -> bool {
        return (self.bits & option) != 0;
    }

    pub fn set(&mut self, option: u32) {
        self.bits |= option;
    }

    pub fn any_reserved(&self) -> bool {
        return (self.bits & RESERVED_KDC_OPTIONS) != 0;
    }
}

impl fmt::Display for KdcOptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (kdc_options::FORWARDABLE, "forwardable"),
            (kdc_options::FORWARDED, "forwarded"),
            (kdc_options::PROXIABLE, "proxiable"),
            (kdc_options::PROXY, "proxy"),
            (kdc_options::ALLOW_POSTDATE, "allow_postdate"),
            (kdc_options::POSTDATED, "postdated"),
            (kdc_options::RENEWABLE, "renewable"),
            (kdc_options::RENEWABLE_OK, "renewable_ok"),
            (kdc_options::ENC_TKT_IN_SKEY, "enc_tkt_in_skey"),
            (kdc_options::RENEW, "renew"),
            (kdc_options::VALIDATE, "validate"),
        ];

        let mut option_strs = Vec::new();
        for &(option, name) in names.iter() {
            if self.is_set(option) {
                option_strs.push(name);
            }
        }

        return write!(f, "{:#010x} -> {}", self.bits, option_strs.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_independent_bits() {
        let mut flags = TicketFlagSet::new();
        flags.set(ticket_flags::FORWARDABLE);
        flags.set(ticket_flags::INVALID);

        assert!(flags.is_set(ticket_flags::FORWARDABLE));
        assert!(flags.is_set(ticket_flags::INVALID));
        assert!(!flags.is_set(ticket_flags::RENEWABLE));

        flags.clear(ticket_flags::INVALID);
        assert!(flags.is_set(ticket_flags::FORWARDABLE));
        assert!(!flags.is_set(ticket_flags::INVALID));
    }

    #[test]
    fn test_reserved_mask_excludes_assigned_options() {
        let assigned = kdc_options::FORWARDABLE
            | kdc_options::FORWARDED
            | kdc_options::PROXIABLE
            | kdc_options::PROXY
            | kdc_options::ALLOW_POSTDATE
            | kdc_options::POSTDATED
            | kdc_options::RENEWABLE
            | kdc_options::RENEWABLE_OK
            | kdc_options::ENC_TKT_IN_SKEY
            | kdc_options::RENEW
            | kdc_options::VALIDATE;

        assert_eq!(0, assigned & RESERVED_KDC_OPTIONS);
        assert!(KdcOptionSet::from_bits(0x8000_0000).any_reserved());
        assert!(!KdcOptionSet::from_bits(assigned).any_reserved());
    }
}
