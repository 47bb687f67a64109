//! DPP Authentication key schedule: R-auth/I-auth transcript hashes and
//! the k1/k2/ke key derivation chain (EasyConnect 3.2.2, 6.3.3/6.3.4).
//!
//! Grounded on `dpp_derive_r_auth`, `dpp_derive_i_auth`, `dpp_derive_k1`,
//! `dpp_derive_k2`, `dpp_derive_ke`, `dpp_derive_li` and `dpp_derive_lr`
//! in the original source. All "ECDH" here means multiplying a private
//! scalar by a peer's public point — never actually socket I/O, just
//! [`Curve::ecdh_x`] / [`Curve::scalar_mul`].

use crate::crypto::HashAlg;
use crate::dpp::ecc::Curve;
use crate::error::Result;

/// `R-auth = H(I-nonce | R-nonce | PI.x | PR.x | [BI.x |] BR.x | 0)`
///
/// `i_boot_x` is `None` when mutual authentication is not in use.
pub fn derive_r_auth(
    curve: Curve,
    i_nonce: &[u8],
    r_nonce: &[u8],
    i_proto_x: &[u8],
    r_proto_x: &[u8],
    i_boot_x: Option<&[u8]>,
    r_boot_x: &[u8],
) -> Result<Vec<u8>> {
    let hash = HashAlg::from_key_len(curve.scalar_bytes()).ok_or(crate::error::Error::InvalidArgument)?;
    let zero = [0u8];
    let mut parts: Vec<&[u8]> = vec![i_nonce, r_nonce, i_proto_x, r_proto_x];
    if let Some(bi) = i_boot_x {
        parts.push(bi);
    }
    parts.push(r_boot_x);
    parts.push(&zero);
    Ok(hash.hash(&parts))
}

/// `I-auth = H(R-nonce | I-nonce | PR.x | PI.x | BR.x | [BI.x |] 1)`
pub fn derive_i_auth(
    curve: Curve,
    r_nonce: &[u8],
    i_nonce: &[u8],
    r_proto_x: &[u8],
    i_proto_x: &[u8],
    r_boot_x: &[u8],
    i_boot_x: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let hash = HashAlg::from_key_len(curve.scalar_bytes()).ok_or(crate::error::Error::InvalidArgument)?;
    let one = [1u8];
    let mut parts: Vec<&[u8]> = vec![r_nonce, i_nonce, r_proto_x, i_proto_x, r_boot_x];
    if let Some(bi) = i_boot_x {
        parts.push(bi);
    }
    parts.push(&one);
    Ok(hash.hash(&parts))
}

/// `M = boot_private . i_proto_public`, `k1 = HKDF(0^key_len, "first intermediate key", M.x)`.
///
/// Returns `(m_x, k1)`. `boot_private` and `i_proto_public` are whichever
/// pair of keys this party holds for the exchange; ECDH is symmetric so
/// the Initiator and Responder reach the same `M` from their own halves.
pub fn derive_k1(curve: Curve, i_proto_public: &[u8], boot_private: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let m_x = curve.ecdh_x(boot_private, i_proto_public)?;
    let hash = HashAlg::from_key_len(m_x.len()).ok_or(crate::error::Error::InvalidArgument)?;
    let zero_salt = vec![0u8; m_x.len()];
    let k1 = hash.hkdf(&zero_salt, b"first intermediate key", &m_x, m_x.len());
    Ok((m_x, k1))
}

/// `N = proto_private . i_proto_public`, `k2 = HKDF(0^key_len, "second intermediate key", N.x)`.
///
/// Returns `(n_x, k2)`.
pub fn derive_k2(curve: Curve, i_proto_public: &[u8], proto_private: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let n_x = curve.ecdh_x(proto_private, i_proto_public)?;
    let hash = HashAlg::from_key_len(n_x.len()).ok_or(crate::error::Error::InvalidArgument)?;
    let zero_salt = vec![0u8; n_x.len()];
    let k2 = hash.hkdf(&zero_salt, b"second intermediate key", &n_x, n_x.len());
    Ok((n_x, k2))
}

/// `bk = HKDF-Extract(I-nonce | R-nonce, M.x | N.x [| L.x])`,
/// `ke = HKDF-Expand(bk, "DPP Key", key_len)`.
///
/// `l_x` carries mutual authentication's `L.x` when present.
pub fn derive_ke(
    hash: HashAlg,
    i_nonce: &[u8],
    r_nonce: &[u8],
    m_x: &[u8],
    n_x: &[u8],
    l_x: Option<&[u8]>,
) -> Vec<u8> {
    let key_len = m_x.len();
    let mut salt = Vec::with_capacity(i_nonce.len() + r_nonce.len());
    salt.extend_from_slice(i_nonce);
    salt.extend_from_slice(r_nonce);

    let mut ikm = Vec::with_capacity(key_len * 3);
    ikm.extend_from_slice(m_x);
    ikm.extend_from_slice(n_x);
    if let Some(l) = l_x {
        ikm.extend_from_slice(l);
    }

    let bk = hash.hkdf_extract(&salt, &ikm);
    hash.hkdf_expand(&bk, b"DPP Key", key_len)
}

/// `L = bI . (BR + PR)` — the Initiator's half of mutual authentication's
/// shared point (6.3.4 DPP Authentication Confirm).
pub fn derive_li(curve: Curve, boot_public_r: &[u8], proto_public_r: &[u8], boot_private_i: &[u8]) -> Result<Vec<u8>> {
    let sum = curve.point_add(boot_public_r, proto_public_r)?;
    curve.scalar_mul(&sum, boot_private_i)
}

/// `L = ((bR + pR) mod q) . BI` — the Responder's half (6.3.3 DPP
/// Authentication Response), equal to [`derive_li`]'s result by the EC
/// group law (invariant: `L_I == L_R`).
pub fn derive_lr(curve: Curve, boot_private_r: &[u8], proto_private_r: &[u8], boot_public_i: &[u8]) -> Result<Vec<u8>> {
    let sum = curve.scalar_add_mod_n(boot_private_r, proto_private_r)?;
    curve.scalar_mul(boot_public_i, &sum)
}
