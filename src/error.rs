use chrono::Utc;
use kerberos_asn1::{KrbError, PrincipalName};
use kerberos_constants::error_codes;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, KerberosError>;

/// Protocol failure of a KDC exchange, carrying the RFC 4120 error code
/// that will be answered to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct KerberosError {
    error_code: i32,
    explanation: Option<String>,
}

impl KerberosError {
    pub fn new(error_code: i32) -> Self {
        return Self {
            error_code,
            explanation: None,
        };
    }

    pub fn with_text<S: Into<String>>(error_code: i32, text: S) -> Self {
        return Self {
            error_code,
            explanation: Some(text.into()),
        };
    }

    /// Failures of collaborators that have no protocol meaning of their
    /// own (store I/O, unexpected decode states).
    pub fn generic<S: Into<String>>(text: S) -> Self {
        return Self::with_text(error_codes::KRB_ERR_GENERIC, text);
    }

    pub fn error_code(&self) -> i32 {
        return self.error_code;
    }

    /// Builds the on-wire KRB-ERROR answering a failed request, stamped
    /// with the current server time.
    pub fn to_krb_error(
        &self,
        realm: &str,
        sname: PrincipalName,
    ) -> KrbError {
        let now = Utc::now();

        let mut krb_error = KrbError::default();
        krb_error.pvno = 5;
        krb_error.msg_type = 30;
        krb_error.stime = now.into();
        krb_error.susec = now.timestamp_subsec_micros() as _;
        krb_error.error_code = self.error_code;
        krb_error.realm = realm.to_string();
        krb_error.sname = sname;
        krb_error.e_text = self.explanation.clone();

        return krb_error;
    }
}

impl fmt::Display for KerberosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code_string = error_codes::error_code_to_string(self.error_code);
        match &self.explanation {
            Some(text) => {
                write!(f, "{} {}: {}", self.error_code, code_string, text)
            }
            None => write!(f, "{} {}", self.error_code, code_string),
        }
    }
}

impl From<i32> for KerberosError {
    fn from(error_code: i32) -> Self {
        return Self::new(error_code);
    }
}
