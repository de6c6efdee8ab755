use sha1::{Digest, Sha1};
use std::fmt;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// SHA-1 fingerprint of a section's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionDigest([u8; DIGEST_LEN]);

impl SectionDigest {
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    pub fn to_hex(&self) -> String {
        format!("{self:x}")
    }
}

impl fmt::LowerHex for SectionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SectionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionDigest({self:x})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_the_well_known_digest() {
        assert_eq!(
            SectionDigest::of(&[]).to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn known_vector() {
        assert_eq!(
            SectionDigest::of(b"abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn deterministic() {
        let data = b"the same bytes twice";
        assert_eq!(SectionDigest::of(data), SectionDigest::of(data));
        assert_ne!(SectionDigest::of(data), SectionDigest::of(b"other bytes"));
    }

    #[test]
    fn hex_is_forty_lowercase_chars() {
        let hex = SectionDigest::of(b"\xff\x00").to_hex();
        assert_eq!(hex.len(), DIGEST_LEN * 2);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
