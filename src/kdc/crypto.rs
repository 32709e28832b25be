use crate::error::{KerberosError, Result};
use kerberos_asn1::{Checksum, EncryptedData, EncryptionKey};
use kerberos_constants::{checksum_types, error_codes};
use kerberos_crypto::{checksum_hmac_md5, new_kerberos_cipher, Key};

/// Seals and unseals the encrypted parts of KDC exchanges with the
/// cipher belonging to the key's encryption type.
#[derive(Debug, Default)]
pub struct CipherTextHandler;

impl CipherTextHandler {
    pub fn new() -> Self {
        return Self;
    }

    pub fn seal(
        &self,
        key: &EncryptionKey,
        plaintext: &[u8],
        key_usage: i32,
    ) -> Result<EncryptedData> {
        let cipher = new_kerberos_cipher(key.keytype).map_err(|_| {
            KerberosError::new(error_codes::KDC_ERR_ETYPE_NOSUPP)
        })?;

        let cipher_text = cipher.encrypt(&key.keyvalue, key_usage, plaintext);
        return Ok(EncryptedData::new(key.keytype, None, cipher_text));
    }

    /// Decryption failures surface as modified-message errors: a wrong
    /// key and a tampered ciphertext are indistinguishable here.
    pub fn unseal(
        &self,
        key: &EncryptionKey,
        data: &EncryptedData,
        key_usage: i32,
    ) -> Result<Vec<u8>> {
        if key.keytype != data.etype {
            return Err(KerberosError::with_text(
                error_codes::KRB_AP_ERR_MODIFIED,
                format!(
                    "key etype {} does not match data etype {}",
                    key.keytype, data.etype
                ),
            ));
        }

        let cipher = new_kerberos_cipher(data.etype).map_err(|_| {
            KerberosError::new(error_codes::KDC_ERR_ETYPE_NOSUPP)
        })?;

        return cipher
            .decrypt(&key.keyvalue, key_usage, &data.cipher)
            .map_err(|error| {
                KerberosError::with_text(
                    error_codes::KRB_AP_ERR_MODIFIED,
                    format!("{}", error),
                )
            });
    }
}

/// Verifies the checksums clients attach to authenticators.
#[derive(Debug, Default)]
pub struct ChecksumHandler;

impl ChecksumHandler {
    pub fn new() -> Self {
        return Self;
    }

    pub fn verify_checksum(
        &self,
        cksum: &Checksum,
        bytes: &[u8],
        key: &EncryptionKey,
        key_usage: i32,
    ) -> Result<()> {
        match cksum.cksumtype {
            checksum_types::HMAC_MD5 => {
                let expected =
                    checksum_hmac_md5(&key.keyvalue, key_usage, bytes);
                if expected != cksum.checksum {
                    return Err(KerberosError::new(
                        error_codes::KRB_AP_ERR_MODIFIED,
                    ));
                }
                return Ok(());
            }
            other => {
                return Err(KerberosError::with_text(
                    error_codes::KRB_AP_ERR_INAPP_CKSUM,
                    format!("unsupported checksum type {}", other),
                ));
            }
        }
    }
}

/// Fresh random session key for the given encryption type.
pub fn random_key(etype: i32) -> Result<EncryptionKey> {
    let key = Key::random(etype).map_err(|_| {
        KerberosError::new(error_codes::KDC_ERR_ETYPE_NOSUPP)
    })?;

    return Ok(EncryptionKey {
        keytype: etype,
        keyvalue: key.as_bytes().to_vec(),
    });
}
