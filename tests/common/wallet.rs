use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

use wallet_auth::services::signature::SignatureVerifier;

/// A deterministic secp256k1 keypair that signs the way browser wallets do.
///
/// The address is derived here, not borrowed from the code under test, so the
/// tests double as a check on the server's own recovery path.
#[allow(dead_code)]
pub struct TestWallet {
    secret_key: SecretKey,
    pub address: String,
}

#[allow(dead_code)]
impl TestWallet {
    pub fn new(seed: u8) -> Self {
        assert_ne!(seed, 0, "the all-zero key is not a valid secp256k1 scalar");
        let secret_key =
            SecretKey::from_slice(&[seed; 32]).expect("seed bytes form a valid secret key");
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let uncompressed = public_key.serialize_uncompressed();

        let mut hasher = Keccak256::new();
        hasher.update(&uncompressed[1..]);
        let digest = hasher.finalize();
        let address = format!("0x{}", hex::encode(&digest[12..]));

        Self {
            secret_key,
            address,
        }
    }

    /// EIP-191 personal_sign: 0x-prefixed hex over r || s || v, v in {27, 28}.
    pub fn sign(&self, message: &str) -> String {
        let digest = SignatureVerifier::personal_message_digest(message);
        let secp = Secp256k1::new();
        let msg = Message::from_digest_slice(&digest).expect("digest is 32 bytes");
        let signature = secp.sign_ecdsa_recoverable(&msg, &self.secret_key);
        let (recovery_id, bytes) = signature.serialize_compact();

        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&bytes);
        raw[64] = recovery_id.to_i32() as u8 + 27;
        format!("0x{}", hex::encode(raw))
    }
}
