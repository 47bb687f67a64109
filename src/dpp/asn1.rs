//! Minimal hand-rolled DER encode/decode for the one ASN.1 shape DPP
//! actually needs: a `SubjectPublicKeyInfo`-style wrapper around a
//! compressed EC point.
//!
//! Grounded on `dpp_point_to_asn1`/`dpp_point_from_asn1`. Only the exact
//! shape the original checks for is supported — this is not a general
//! DER parser.
//!
//! ```text
//! SEQUENCE {
//!     SEQUENCE {
//!         OBJECT IDENTIFIER ecPublicKey (1.2.840.10045.2.1)
//!         OBJECT IDENTIFIER curve (prime256v1 | secp384r1)
//!     }
//!     BIT STRING (0x00 unused-bits || compressed point)
//! }
//! ```

use crate::dpp::ecc::Curve;
use crate::error::{Error, Result};

const ASN1_ID_SEQUENCE: u8 = 0x30;
const ASN1_ID_OID: u8 = 0x06;
const ASN1_ID_BIT_STRING: u8 = 0x03;

const EC_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
const EC_P256_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
const EC_P384_OID: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x22];

fn push_tlv(out: &mut Vec<u8>, tag: u8, body: &[u8]) {
    out.push(tag);
    // Every body this module ever emits fits in a single short-form
    // length byte (at most ~30 bytes: an OID or a P-384 compressed point).
    out.push(body.len() as u8);
    out.extend_from_slice(body);
}

/// Encode a compressed EC point as a `SubjectPublicKeyInfo`-shaped DER blob.
pub fn point_to_der(curve: Curve, uncompressed_point: &[u8]) -> Result<Vec<u8>> {
    let curve_oid = match curve {
        Curve::P256 => EC_P256_OID,
        Curve::P384 => EC_P384_OID,
    };
    let compressed = curve.compress(uncompressed_point)?;

    let mut oids = Vec::new();
    push_tlv(&mut oids, ASN1_ID_OID, EC_OID);
    push_tlv(&mut oids, ASN1_ID_OID, curve_oid);
    let mut alg_id = Vec::new();
    push_tlv(&mut alg_id, ASN1_ID_SEQUENCE, &oids);

    let mut bit_string_body = Vec::with_capacity(1 + compressed.len());
    bit_string_body.push(0x00);
    bit_string_body.extend_from_slice(&compressed);

    let mut inner = alg_id;
    push_tlv(&mut inner, ASN1_ID_BIT_STRING, &bit_string_body);

    let mut out = Vec::new();
    push_tlv(&mut out, ASN1_ID_SEQUENCE, &inner);
    Ok(out)
}

fn read_tlv<'a>(buf: &'a [u8], pos: usize) -> Result<(u8, &'a [u8], usize)> {
    if pos + 2 > buf.len() {
        return Err(Error::BadMessage);
    }
    let tag = buf[pos];
    let len = buf[pos + 1] as usize;
    if len & 0x80 != 0 {
        // Long-form lengths never occur in the short blobs this codec
        // produces or needs to consume.
        return Err(Error::Unsupported);
    }
    let start = pos + 2;
    let end = start + len;
    if end > buf.len() {
        return Err(Error::BadMessage);
    }
    Ok((tag, &buf[start..end], end))
}

/// Decode a `SubjectPublicKeyInfo`-shaped DER blob back to `(curve, uncompressed point)`.
pub fn point_from_der(der: &[u8]) -> Result<(Curve, Vec<u8>)> {
    let (outer_tag, outer, _) = read_tlv(der, 0)?;
    if outer_tag != ASN1_ID_SEQUENCE {
        return Err(Error::BadMessage);
    }

    let (inner_tag, inner, inner_end) = read_tlv(outer, 0)?;
    if inner_tag != ASN1_ID_SEQUENCE {
        return Err(Error::BadMessage);
    }

    let (oid1_tag, oid1, oid1_end) = read_tlv(inner, 0)?;
    if oid1_tag != ASN1_ID_OID || oid1 != EC_OID {
        return Err(Error::BadMessage);
    }
    let (oid2_tag, oid2, _) = read_tlv(inner, oid1_end)?;
    if oid2_tag != ASN1_ID_OID {
        return Err(Error::BadMessage);
    }
    let curve = if oid2 == EC_P256_OID {
        Curve::P256
    } else if oid2 == EC_P384_OID {
        Curve::P384
    } else {
        return Err(Error::Unsupported);
    };

    let (bits_tag, bits, _) = read_tlv(outer, inner_end)?;
    if bits_tag != ASN1_ID_BIT_STRING || bits.len() < 2 {
        return Err(Error::BadMessage);
    }
    // bits[0] is the "unused bits in the last octet" count, always 0 here.
    let point = curve.point_from_sec1(&bits[1..])?;
    Ok((curve, point))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_p256_point() {
        let curve = Curve::P256;
        let mut priv_key = vec![0u8; 32];
        priv_key[31] = 42;
        let point = curve.public_from_private(&priv_key).unwrap();

        let der = point_to_der(curve, &point).unwrap();
        let (decoded_curve, decoded_point) = point_from_der(&der).unwrap();
        assert_eq!(decoded_curve, Curve::P256);
        assert_eq!(decoded_point, point);
    }

    #[test]
    fn round_trips_p384_point() {
        let curve = Curve::P384;
        let mut priv_key = vec![0u8; 48];
        priv_key[47] = 7;
        let point = curve.public_from_private(&priv_key).unwrap();

        let der = point_to_der(curve, &point).unwrap();
        let (decoded_curve, decoded_point) = point_from_der(&der).unwrap();
        assert_eq!(decoded_curve, Curve::P384);
        assert_eq!(decoded_point, point);
    }

    #[test]
    fn rejects_truncated_der() {
        assert_eq!(point_from_der(&[0x30, 0x10]), Err(Error::BadMessage));
    }
}
