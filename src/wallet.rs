use anyhow::{Result, anyhow};
use libsecp256k1::{Message, PublicKey, SecretKey};
use sha3::{Digest, Keccak256};

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// A wallet identity plus its signing key. Immutable once loaded; the secret
/// never leaves this module.
#[derive(Clone)]
pub struct Wallet {
    pub address: String,
    secret: SecretKey,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Parse a hex private key (with or without a `0x` prefix) and derive the
    /// EIP-55 checksummed address.
    pub fn from_private_key(raw: &str) -> Result<Self> {
        let stripped = raw.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped).map_err(|e| anyhow!("invalid key hex: {e}"))?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("private key must be 32 bytes, got {}", bytes.len()))?;
        let secret =
            SecretKey::parse(&key).map_err(|e| anyhow!("invalid secp256k1 key: {e:?}"))?;

        let public = PublicKey::from_secret_key(&secret);
        let uncompressed = public.serialize();
        let digest = keccak256(&uncompressed[1..]);
        let address = checksum_address(&digest[12..]);

        Ok(Self { address, secret })
    }

    /// EIP-191 personal-message signature over `message`, returned as the
    /// usual `0x || r || s || v` hex string with `v = recovery_id + 27`.
    /// Pure and local; infallible once the wallet exists.
    pub fn sign_message(&self, message: &str) -> String {
        let prefixed = format!("{PERSONAL_MESSAGE_PREFIX}{}{}", message.len(), message);
        let digest = keccak256(prefixed.as_bytes());
        let (signature, recovery) = libsecp256k1::sign(&Message::parse(&digest), &self.secret);

        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&signature.serialize());
        raw[64] = recovery.serialize() + 27;
        format!("0x{}", hex::encode(raw))
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// EIP-55 mixed-case checksum encoding of a 20-byte address.
fn checksum_address(bytes: &[u8]) -> String {
    let lower = hex::encode(bytes);
    let digest = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test vector (hardhat dev account #0).
    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn derives_checksummed_address() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        assert_eq!(wallet.address, ADDRESS);
    }

    #[test]
    fn accepts_0x_prefixed_keys() {
        let wallet = Wallet::from_private_key(&format!("0x{KEY}")).unwrap();
        assert_eq!(wallet.address, ADDRESS);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(Wallet::from_private_key("not-hex").is_err());
        assert!(Wallet::from_private_key("abcd").is_err());
        assert!(Wallet::from_private_key("").is_err());
    }

    #[test]
    fn signature_has_expected_shape() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        let sig = wallet.sign_message("test-nonce");
        assert!(sig.starts_with("0x"));
        // 65 bytes hex-encoded plus the prefix.
        assert_eq!(sig.len(), 132);
        let v = u8::from_str_radix(&sig[130..], 16).unwrap();
        assert!(v == 27 || v == 28, "unexpected recovery byte {v}");
    }

    #[test]
    fn signing_is_deterministic() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        assert_eq!(wallet.sign_message("abc"), wallet.sign_message("abc"));
        assert_ne!(wallet.sign_message("abc"), wallet.sign_message("abd"));
    }
}
