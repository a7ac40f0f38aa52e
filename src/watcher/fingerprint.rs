//! 128-bit content fingerprints.

use std::fmt;

/// Fingerprint length in bytes.
pub const FINGERPRINT_LEN: usize = 16;

/// Digest of an aggregated payload.
///
/// The first 16 bytes of the BLAKE3 extendable output over the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprint `bytes` in one shot.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = FingerprintHasher::new();
        hasher.update(bytes);
        hasher.finalize()
    }

    /// Fingerprint of the empty byte sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::of(&[])
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, 32 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

// `blake3::Hash::to_hex` only renders the full 32-byte digest.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; FINGERPRINT_LEN]> for Fingerprint {
    fn from(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }
}

/// Streaming fingerprint computation.
///
/// Feeding chunks one by one yields the same fingerprint as hashing their
/// concatenation.
#[derive(Clone, Default)]
pub struct FingerprintHasher {
    inner: blake3::Hasher,
}

impl fmt::Debug for FingerprintHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintHasher")
            .field("partial", &self.finalize())
            .finish()
    }
}

impl FingerprintHasher {
    /// Create an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Produce the fingerprint of everything fed so far.
    #[must_use]
    pub fn finalize(&self) -> Fingerprint {
        let mut out = [0u8; FINGERPRINT_LEN];
        self.inner.finalize_xof().fill(&mut out);
        Fingerprint(out)
    }
}
