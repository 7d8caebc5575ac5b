use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};
use sha3::{Digest, Keccak256};

/// EIP-191 prefix prepended by personal_sign before hashing.
const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),
}

pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Keccak-256 digest of a message framed the way personal_sign frames it:
    /// prefix, the message's byte length in decimal, then the message itself.
    pub fn personal_message_digest(message: &str) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
        hasher.update(message.len().to_string().as_bytes());
        hasher.update(message.as_bytes());
        hasher.finalize().into()
    }

    /// Recover the signer address from a 65-byte r || s || v signature
    /// over the personal_sign framing of `message`.
    ///
    /// Accepts both raw (0/1) and Ethereum-style (27/28) recovery ids.
    pub fn recover(message: &str, signature: &str) -> Result<String, SignatureError> {
        let sig_bytes = hex::decode(signature.trim_start_matches("0x"))
            .map_err(|e| SignatureError::RecoveryFailed(format!("Invalid hex: {}", e)))?;

        if sig_bytes.len() != 65 {
            return Err(SignatureError::RecoveryFailed(format!(
                "Expected 65 signature bytes, got {}",
                sig_bytes.len()
            )));
        }

        let v = sig_bytes[64];
        let rec_id = match v {
            0 | 1 => v as i32,
            27 | 28 => (v - 27) as i32,
            other => {
                return Err(SignatureError::RecoveryFailed(format!(
                    "Unsupported recovery id {}",
                    other
                )))
            }
        };
        let rec_id = RecoveryId::from_i32(rec_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        let sig = RecoverableSignature::from_compact(&sig_bytes[..64], rec_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

        let digest = Self::personal_message_digest(message);
        let msg = Message::from_digest_slice(&digest)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

        let secp = Secp256k1::new();
        let public_key = secp
            .recover_ecdsa(&msg, &sig)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

        Ok(Self::address_from_public_key(&public_key))
    }

    /// Check that `signature` over `message` was produced by `expected_address`.
    /// Comparison is case-insensitive and malformed input reads as a mismatch,
    /// never an error.
    pub fn verify(message: &str, signature: &str, expected_address: &str) -> bool {
        match Self::recover(message, signature) {
            Ok(recovered) => recovered.eq_ignore_ascii_case(expected_address),
            Err(_) => false,
        }
    }

    /// Ethereum address derivation: keccak256 of the 64-byte public key point
    /// (0x04 prefix stripped), keeping the last 20 bytes.
    fn address_from_public_key(public_key: &PublicKey) -> String {
        let uncompressed = public_key.serialize_uncompressed();
        let mut hasher = Keccak256::new();
        hasher.update(&uncompressed[1..]);
        let hash = hasher.finalize();
        format!("0x{}", hex::encode(&hash[12..]))
    }
}
