use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x3c6e_f372_fe94_f82b;

/// Stable 128-bit content fingerprint used for dirty tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        // Length prefix keeps ("ab","c") and ("a","bc") apart.
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    /// Hash the canonical JSON encoding of a serializable value.
    ///
    /// Falls back to hashing a marker byte if serialization fails.
    pub(crate) fn write_serialize<T: serde::Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.write_u8(1);
                self.write_bytes(&bytes);
            }
            Err(err) => {
                tracing::warn!(%err, "fingerprint serialization failed");
                self.write_u8(0);
            }
        }
    }

    pub(crate) fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
