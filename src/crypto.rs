//! Shared hash/HMAC/HKDF primitives, selected at runtime by key length.
//!
//! DPP and FT both need a hash family chosen by key byte length (32/48/64
//! → SHA-256/384/512) rather than by curve identity, so the selection
//! logic lives here once and both modules dispatch through [`HashAlg`].
//! Grounded on `dpp_sha_from_key_len`/`dpp_hkdf`/`dpp_hash` in the
//! original source, generalized from DPP-only use to the FT HMAC-SHA384
//! MIC as well.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// A hash family selected by the byte length of the key material in play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlg {
    /// 32-byte keys (P-256, AES-128-CMAC KCK).
    Sha256,
    /// 48-byte keys (P-384, HMAC-SHA384 KCK).
    Sha384,
    /// 64-byte keys.
    Sha512,
}

impl HashAlg {
    /// Select a hash family from a key's byte length, per
    /// `dpp_sha_from_key_len`. Returns `None` for unrecognized lengths.
    pub fn from_key_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(HashAlg::Sha256),
            48 => Some(HashAlg::Sha384),
            64 => Some(HashAlg::Sha512),
            _ => None,
        }
    }

    /// Nonce length associated with this key length, per
    /// `dpp_nonce_len_from_key_len`: half the key length.
    pub fn nonce_len(self) -> usize {
        match self {
            HashAlg::Sha256 => 16,
            HashAlg::Sha384 => 24,
            HashAlg::Sha512 => 32,
        }
    }

    /// Digest/key length in bytes for this hash family.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }

    /// `H(parts[0] || parts[1] || ...)`.
    pub fn hash(self, parts: &[&[u8]]) -> Vec<u8> {
        macro_rules! go {
            ($H:ty) => {{
                let mut h = <$H>::new();
                for p in parts {
                    h.update(p);
                }
                h.finalize().to_vec()
            }};
        }
        match self {
            HashAlg::Sha256 => go!(Sha256),
            HashAlg::Sha384 => go!(Sha384),
            HashAlg::Sha512 => go!(Sha512),
        }
    }

    /// `HMAC(key, parts[0] || parts[1] || ...)`.
    pub fn hmac(self, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        macro_rules! go {
            ($H:ty) => {{
                let mut m = <Hmac<$H>>::new_from_slice(key).expect("hmac accepts any key length");
                for p in parts {
                    m.update(p);
                }
                m.finalize().into_bytes().to_vec()
            }};
        }
        match self {
            HashAlg::Sha256 => go!(Sha256),
            HashAlg::Sha384 => go!(Sha384),
            HashAlg::Sha512 => go!(Sha512),
        }
    }

    /// `HKDF-Extract(salt, ikm)`.
    pub fn hkdf_extract(self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        macro_rules! go {
            ($H:ty) => {{
                let (prk, _) = Hkdf::<$H>::extract(Some(salt), ikm);
                prk.to_vec()
            }};
        }
        match self {
            HashAlg::Sha256 => go!(Sha256),
            HashAlg::Sha384 => go!(Sha384),
            HashAlg::Sha512 => go!(Sha512),
        }
    }

    /// `HKDF-Expand(prk, info, len)`.
    pub fn hkdf_expand(self, prk: &[u8], info: &[u8], len: usize) -> Vec<u8> {
        macro_rules! go {
            ($H:ty) => {{
                let hk = Hkdf::<$H>::from_prk(prk).expect("prk is this hash's digest length");
                let mut out = vec![0u8; len];
                hk.expand(info, &mut out).expect("len is within 255*hash_len");
                out
            }};
        }
        match self {
            HashAlg::Sha256 => go!(Sha256),
            HashAlg::Sha384 => go!(Sha384),
            HashAlg::Sha512 => go!(Sha512),
        }
    }

    /// `key = HKDF(salt, info, ikm)`, i.e. extract-then-expand in one call,
    /// matching `dpp_hkdf` (a `NULL` salt there means an all-zero buffer
    /// of `salt_len` bytes, which callers pass explicitly here).
    pub fn hkdf(self, salt: &[u8], info: &[u8], ikm: &[u8], len: usize) -> Vec<u8> {
        let prk = self.hkdf_extract(salt, ikm);
        self.hkdf_expand(&prk, info, len)
    }

    /// IEEE 802.11 `prf+`: `T_i = HMAC(key, i || parts...)` for
    /// `i = 1, 2, ...`, concatenated and truncated to `len` bytes. Used
    /// by the PKEX `z` derivation. Distinct from RFC 5869 HKDF-expand,
    /// which appends the counter after the previous block instead of
    /// prepending it before the info.
    pub fn prf_plus(self, key: &[u8], parts: &[&[u8]], len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len + self.digest_len());
        let mut counter: u8 = 1;
        while out.len() < len {
            let counter_byte = [counter];
            let mut block_parts = Vec::with_capacity(parts.len() + 1);
            block_parts.push(counter_byte.as_slice());
            block_parts.extend_from_slice(parts);
            out.extend_from_slice(&self.hmac(key, &block_parts));
            counter += 1;
        }
        out.truncate(len);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_len_selects_hash() {
        assert_eq!(HashAlg::from_key_len(32), Some(HashAlg::Sha256));
        assert_eq!(HashAlg::from_key_len(48), Some(HashAlg::Sha384));
        assert_eq!(HashAlg::from_key_len(64), Some(HashAlg::Sha512));
        assert_eq!(HashAlg::from_key_len(20), None);
    }

    #[test]
    fn hkdf_matches_extract_then_expand() {
        let ikm = b"some input key material";
        let salt = [0u8; 32];
        let one_shot = HashAlg::Sha256.hkdf(&salt, b"info", ikm, 32);
        let prk = HashAlg::Sha256.hkdf_extract(&salt, ikm);
        let two_step = HashAlg::Sha256.hkdf_expand(&prk, b"info", 32);
        assert_eq!(one_shot, two_step);
    }

    #[test]
    fn prf_plus_is_deterministic_and_sized() {
        let out = HashAlg::Sha256.prf_plus(b"key", &[b"a", b"b"], 50);
        assert_eq!(out.len(), 50);
        let out2 = HashAlg::Sha256.prf_plus(b"key", &[b"a", b"b"], 50);
        assert_eq!(out, out2);
    }
}
