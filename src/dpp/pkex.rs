//! PKEX (Public Key Exchange) bootstrapping: the fixed generator points,
//! the `Qi`/`Qr` code-derived points, the `z` shared secret, and the
//! `u`/`v` commit-reveal MACs (EasyConnect 5.6.2/5.6.3).
//!
//! Grounded on `dpp_derive_q`/`dpp_derive_qi`/`dpp_derive_qr`/
//! `dpp_derive_z`/`dpp_derive_u`/`dpp_derive_v` and the
//! `dpp_pkex_initiator_p256`/`dpp_pkex_responder_p256` constants in the
//! original source. PKEX there is P-256-only (the function names say so
//! explicitly), so this module is not curve-generic.
//!
//! The constant byte arrays below are copied verbatim from the WFA Easy
//! Connect v3.0 Role-specific Elements for NIST P-256 (C.1), as given in
//! the original source, to avoid any transcription error in the X/Y
//! coordinates.

use crate::crypto::HashAlg;
use crate::dpp::ecc::Curve;
use crate::error::Result;

const CURVE: Curve = Curve::P256;

/// WFA Easy Connect v3.0 C.1 role-specific element for the Initiator.
const PKEX_INITIATOR_P256_X: [u8; 32] = [
    0x56, 0x26, 0x12, 0xcf, 0x36, 0x48, 0xfe, 0x0b, 0x07, 0x04, 0xbb, 0x12, 0x22, 0x50, 0xb2, 0x54, 0xb1, 0x94, 0x64,
    0x7e, 0x54, 0xce, 0x08, 0x07, 0x2e, 0xec, 0xca, 0x74, 0x5b, 0x61, 0x2d, 0x25,
];
const PKEX_INITIATOR_P256_Y: [u8; 32] = [
    0x3e, 0x44, 0xc7, 0xc9, 0x8c, 0x1c, 0xa1, 0x0b, 0x20, 0x09, 0x93, 0xb2, 0xfd, 0xe5, 0x69, 0xdc, 0x75, 0xbc, 0xad,
    0x33, 0xc1, 0xe7, 0xc6, 0x45, 0x4d, 0x10, 0x1e, 0x6a, 0x3d, 0x84, 0x3c, 0xa4,
];

/// WFA Easy Connect v3.0 C.1 role-specific element for the Responder.
const PKEX_RESPONDER_P256_X: [u8; 32] = [
    0x1e, 0xa4, 0x8a, 0xb1, 0xa4, 0xe8, 0x42, 0x39, 0xad, 0x73, 0x07, 0xf2, 0x34, 0xdf, 0x57, 0x4f, 0xc0, 0x9d, 0x54,
    0xbe, 0x36, 0x1b, 0x31, 0x0f, 0x59, 0x91, 0x52, 0x33, 0xac, 0x19, 0x9d, 0x76,
];
const PKEX_RESPONDER_P256_Y: [u8; 32] = [
    0xd9, 0xfb, 0xf6, 0xb9, 0xf5, 0xfa, 0xdf, 0x19, 0x58, 0xd8, 0x3e, 0xc9, 0x89, 0x7a, 0x35, 0xc1, 0xbd, 0xe9, 0x0b,
    0x77, 0x7a, 0xcb, 0x91, 0x2a, 0xe8, 0x21, 0x3f, 0x47, 0x52, 0x02, 0x4d, 0x67,
];

fn fixed_point(x: &[u8; 32], y: &[u8; 32]) -> Vec<u8> {
    let mut p = Vec::with_capacity(65);
    p.push(0x04);
    p.extend_from_slice(x);
    p.extend_from_slice(y);
    p
}

/// The Initiator's fixed role-specific point `Pi`.
pub fn pi() -> Vec<u8> {
    fixed_point(&PKEX_INITIATOR_P256_X, &PKEX_INITIATOR_P256_Y)
}

/// The Responder's fixed role-specific point `Pr`.
pub fn pr() -> Vec<u8> {
    fixed_point(&PKEX_RESPONDER_P256_X, &PKEX_RESPONDER_P256_Y)
}

/// `Q = H([MAC |] [identifier |] code) . P`.
fn derive_q(p: &[u8], code: &str, identifier: Option<&str>, mac: Option<&[u8; 6]>) -> Result<Vec<u8>> {
    let hash = HashAlg::Sha256;
    let mut parts: Vec<&[u8]> = Vec::with_capacity(3);
    if let Some(m) = mac {
        parts.push(m.as_slice());
    }
    if let Some(id) = identifier {
        parts.push(id.as_bytes());
    }
    parts.push(code.as_bytes());
    let digest = hash.hash(&parts);
    let scalar = CURVE.scalar_from_hash(&digest)?;
    CURVE.scalar_mul(p, &scalar)
}

/// `Qi = H([MAC-Initiator |] [identifier |] code) . Pi`.
pub fn derive_qi(code: &str, identifier: Option<&str>, mac_initiator: Option<&[u8; 6]>) -> Result<Vec<u8>> {
    derive_q(&pi(), code, identifier, mac_initiator)
}

/// `Qr = H([MAC-Responder |] [identifier |] code) . Pr`.
pub fn derive_qr(code: &str, identifier: Option<&str>, mac_responder: Option<&[u8; 6]>) -> Result<Vec<u8>> {
    derive_q(&pr(), code, identifier, mac_responder)
}

/// `z = prf+(HKDF-Extract(<>, K.x), MAC-Initiator | MAC-Responder | M.x | N.x | code)`.
///
/// `identifier` is accepted (PKEX's wire attribute carries one) but, as
/// in the original derivation, not folded into `z` itself.
pub fn derive_z(
    mac_i: &[u8; 6],
    mac_r: &[u8; 6],
    n: &[u8],
    m: &[u8],
    k: &[u8],
    code: &str,
    _identifier: Option<&str>,
) -> Result<Vec<u8>> {
    let hash = HashAlg::Sha256;
    let k_x = CURVE.point_x(k)?;
    let m_x = CURVE.point_x(m)?;
    let n_x = CURVE.point_x(n)?;
    let prk = hash.hkdf_extract(&[], &k_x);
    Ok(hash.prf_plus(
        &prk,
        &[mac_i.as_slice(), mac_r.as_slice(), &m_x, &n_x, code.as_bytes()],
        k_x.len(),
    ))
}

/// Initiator's `u = HMAC(J.x, MAC-Initiator | A.x | Y'.x | X.x)`
/// (the Responder computes the same shape as `u'` over its own points).
pub fn derive_u(j: &[u8], mac_i: &[u8; 6], a: &[u8], y: &[u8], x: &[u8]) -> Result<Vec<u8>> {
    let hash = HashAlg::Sha256;
    let j_x = CURVE.point_x(j)?;
    let a_x = CURVE.point_x(a)?;
    let y_x = CURVE.point_x(y)?;
    let x_x = CURVE.point_x(x)?;
    Ok(hash.hmac(&j_x, &[mac_i.as_slice(), &a_x, &y_x, &x_x]))
}

/// Initiator's `v = HMAC(L.x, MAC-Responder | B.x | X'.x | Y.x)`
/// (the Responder computes the same shape as `v'` over its own points).
/// `mac` is `None` for the PKEXv1 over-the-air variant, which omits it.
pub fn derive_v(l: &[u8], mac: Option<&[u8; 6]>, b: &[u8], x: &[u8], y: &[u8]) -> Result<Vec<u8>> {
    let hash = HashAlg::Sha256;
    let l_x = CURVE.point_x(l)?;
    let b_x = CURVE.point_x(b)?;
    let x_x = CURVE.point_x(x)?;
    let y_x = CURVE.point_x(y)?;
    let mut parts: Vec<&[u8]> = Vec::with_capacity(4);
    if let Some(m) = mac {
        parts.push(m.as_slice());
    }
    parts.push(&b_x);
    parts.push(&x_x);
    parts.push(&y_x);
    Ok(hash.hmac(&l_x, &parts))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pi_and_pr_are_well_formed_points() {
        // Round-tripping through the curve codec validates these are
        // genuine points on P-256, which catches a transcription error
        // in the constants above (an invalid point fails to decode).
        let pi_point = CURVE.point_from_sec1(&pi()).unwrap();
        let pr_point = CURVE.point_from_sec1(&pr()).unwrap();
        assert_eq!(pi_point, pi());
        assert_eq!(pr_point, pr());
    }

    #[test]
    fn derive_qi_is_deterministic() {
        let mac = [0x11u8; 6];
        let q1 = derive_qi("secretcode", None, Some(&mac)).unwrap();
        let q2 = derive_qi("secretcode", None, Some(&mac)).unwrap();
        assert_eq!(q1, q2);
    }

    #[test]
    fn derive_qi_differs_from_qr() {
        let mac = [0x11u8; 6];
        let qi = derive_qi("secretcode", None, Some(&mac)).unwrap();
        let qr = derive_qr("secretcode", None, Some(&mac)).unwrap();
        assert_ne!(qi, qr);
    }

    #[test]
    fn derive_u_and_v_are_deterministic() {
        let mac = [0x22u8; 6];
        let mut priv_key = vec![0u8; 32];
        priv_key[31] = 9;
        let p = CURVE.public_from_private(&priv_key).unwrap();
        let u1 = derive_u(&p, &mac, &p, &p, &p).unwrap();
        let u2 = derive_u(&p, &mac, &p, &p, &p).unwrap();
        assert_eq!(u1, u2);
        assert_eq!(u1.len(), 32);

        let v1 = derive_v(&p, Some(&mac), &p, &p, &p).unwrap();
        assert_eq!(v1.len(), 32);
    }
}
