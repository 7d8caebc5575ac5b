use sha2::{Digest, Sha512};
use totp_rs::{Algorithm, Secret, TOTP};

/// RFC 4648 base32 alphabet, the only encoding authenticator apps accept.
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const TOTP_DIGITS: usize = 6;
const TOTP_STEP_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum MfaError {
    #[error("Invalid TOTP secret: {0}")]
    Secret(String),
    #[error("TOTP setup failed: {0}")]
    Totp(String),
    #[error("QR generation failed: {0}")]
    Qr(String),
    #[error("System time error: {0}")]
    Time(#[from] std::time::SystemTimeError),
}

/// Everything a client needs to register the account with an authenticator app.
pub struct MfaProvisioning {
    pub secret: String,
    pub qr_code: String,
}

/// TOTP provisioning and verification keyed off the wallet address.
///
/// Secrets are derived, not stored: the same address, salt and TOTP
/// parameters always reproduce the same authenticator entry, so there is no
/// secret column to protect and re-enrollment is idempotent.
///
/// Known limitations, accepted as-is: codes are not single-use, so a replay
/// inside the skew window verifies; nothing here throttles code guesses, the
/// only brake is the app-wide request limiter in front of the handlers.
#[derive(Clone)]
pub struct MfaService {
    salt: String,
    issuer: String,
    skew: u8,
}

impl MfaService {
    pub fn new(salt: impl Into<String>, issuer: impl Into<String>, skew: u8) -> Self {
        Self {
            salt: salt.into(),
            issuer: issuer.into(),
            skew,
        }
    }

    /// 32 base32 characters picked from the SHA-512 of "{address}:{salt}",
    /// one character per even-indexed digest byte. The address is lower-cased
    /// first so checksummed and plain spellings derive the same secret.
    ///
    /// Addresses are public, so anyone holding the salt can recompute every
    /// account's secret. Treat the salt like a stored secret table.
    pub fn derive_secret(&self, address: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(address.to_lowercase().as_bytes());
        hasher.update(b":");
        hasher.update(self.salt.as_bytes());
        let digest = hasher.finalize();

        digest
            .chunks(2)
            .map(|pair| BASE32_ALPHABET[(pair[0] % 32) as usize] as char)
            .collect()
    }

    /// Secret plus a QR data URI encoding the otpauth URL for that secret.
    pub fn provisioning(&self, address: &str) -> Result<MfaProvisioning, MfaError> {
        let totp = self.totp(address)?;
        let qr = totp.get_qr_base64().map_err(MfaError::Qr)?;

        Ok(MfaProvisioning {
            secret: totp.get_secret_base32(),
            qr_code: format!("data:image/png;base64,{}", qr),
        })
    }

    /// Check a submitted code against the current time window (± skew steps).
    pub fn verify_code(&self, address: &str, code: &str) -> Result<bool, MfaError> {
        Ok(self.totp(address)?.check_current(code)?)
    }

    /// The code an authenticator would show right now.
    pub fn current_code(&self, address: &str) -> Result<String, MfaError> {
        Ok(self.totp(address)?.generate_current()?)
    }

    /// Generate-then-verify round trip. Run at enrollment time so clock or
    /// derivation problems surface before the user depends on their app.
    pub fn self_check(&self, address: &str) -> Result<bool, MfaError> {
        let totp = self.totp(address)?;
        let code = totp.generate_current()?;
        Ok(totp.check_current(&code)?)
    }

    fn totp(&self, address: &str) -> Result<TOTP, MfaError> {
        let secret = Secret::Encoded(self.derive_secret(address))
            .to_bytes()
            .map_err(|e| MfaError::Secret(format!("{:?}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            self.skew,
            TOTP_STEP_SECS,
            secret,
            Some(self.issuer.clone()),
            address.to_lowercase(),
        )
        .map_err(|e| MfaError::Totp(format!("{:?}", e)))
    }
}
