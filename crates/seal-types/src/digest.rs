use std::fmt;

use crate::error::TypeError;

/// SHA-256 digest of an object's canonical content.
///
/// This is the value a signature envelope commits to. Its canonical text form
/// is exactly 64 lowercase hex characters; that text (not the raw bytes) is
/// the signed payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Number of raw bytes.
    pub const LEN: usize = 32;
    /// Number of characters in the canonical hex form.
    pub const HEX_LEN: usize = 64;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Canonical lowercase hex text.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the canonical text form.
    ///
    /// Uppercase input is rejected rather than normalized: the signed payload
    /// must be byte-identical to what [`to_hex`](Self::to_hex) produces.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::NotLowercase);
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_is_64_lowercase_chars() {
        let d = Digest::from_bytes([0xAB; 32]);
        let hex = d.to_hex();
        assert_eq!(hex.len(), Digest::HEX_LEN);
        assert!(hex.bytes().all(|b| !b.is_ascii_uppercase()));
    }

    #[test]
    fn rejects_uppercase() {
        let upper = Digest::from_bytes([0xAB; 32]).to_hex().to_uppercase();
        assert_eq!(Digest::from_hex(&upper), Err(TypeError::NotLowercase));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Digest::from_hex("abcd"),
            Err(TypeError::InvalidLength { expected: 64, actual: 4 })
        ));
    }

    #[test]
    fn rejects_non_hex_chars() {
        let bad = "g".repeat(64);
        assert!(matches!(Digest::from_hex(&bad), Err(TypeError::InvalidHex(_))));
    }

    proptest! {
        #[test]
        fn hex_text_parses_back(bytes in any::<[u8; 32]>()) {
            let d = Digest::from_bytes(bytes);
            prop_assert_eq!(Digest::from_hex(&d.to_hex()).unwrap(), d);
        }
    }
}
