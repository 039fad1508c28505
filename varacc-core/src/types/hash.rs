/// SHA-1 digest used as the identity key of every accessioned document
use serde::{Deserialize, Serialize};
use std::fmt;

/// 160-bit content hash, rendered as 40 upper-case hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Sha1Hash(pub [u8; 20]);

impl Sha1Hash {
    /// Compute the SHA-1 of raw data
    pub fn compute(data: &[u8]) -> Self {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&result);
        Self(hash)
    }

    /// Create from a hex string (either case)
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        Self::from_bytes(&bytes).map_err(|_| hex::FromHexError::InvalidStringLength)
    }

    /// Upper-case hex, the textual form persisted by the stores
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, anyhow::Error> {
        if bytes.len() != 20 {
            anyhow::bail!("Invalid hash length: expected 20, got {}", bytes.len());
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(bytes);
        Ok(Self(hash))
    }

    /// Truncate to first N hex characters for log lines
    pub fn truncated(&self, len: usize) -> String {
        let hex = self.to_hex();
        if hex.len() <= len {
            hex
        } else {
            format!("{}...", &hex[..len])
        }
    }
}

impl fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha1Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Sha1Hash {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Sha1Hash> for String {
    fn from(hash: Sha1Hash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for Sha1Hash {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let hash = Sha1Hash::compute(b"abc");
        assert_eq!(hash.to_hex(), "A9993E364706816ABA3E25717850C26C9CD0D89D");
    }

    #[test]
    fn test_hex_roundtrip_accepts_lowercase() {
        let hash = Sha1Hash::compute(b"test data");
        let parsed = Sha1Hash::from_hex(&hash.to_hex().to_lowercase()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let hash = Sha1Hash::compute(b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"A9993E364706816ABA3E25717850C26C9CD0D89D\"");
        let back: Sha1Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Sha1Hash::from_hex("ABCD").is_err());
        assert!(Sha1Hash::from_bytes(&[0u8; 32]).is_err());
    }
}
