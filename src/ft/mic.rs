//! FTE MIC computation (IEEE 802.11-2020 13.8.4, 12.8.4-12.8.5).
//!
//! Grounded on `ft_calculate_fte_mic` in the original source: the
//! transcript is `SPA | AA | seq | [RSNE] | MDE | FTE-with-MIC-zeroed |
//! [RIC]`, hashed with AES-128-CMAC when the KCK is 16 bytes, or
//! HMAC-SHA384 truncated to the KCK length otherwise.

use aes::Aes128;
use cmac::{Cmac, Mac};

use crate::crypto::HashAlg;
use crate::error::{Error, Result};
use crate::ft::ie::FtElement;

/// Compute the MIC that belongs in an FTE's MIC field.
///
/// `fte`, if present, is fed in with its MIC field treated as all-zero
/// regardless of the value actually stored on it — callers pass the FTE
/// they're about to send (MIC not yet computed) or the one they received
/// (MIC to be checked against this function's output).
#[allow(clippy::too_many_arguments)]
pub fn calculate_fte_mic(
    kck: &[u8],
    spa: &[u8; 6],
    aa: &[u8; 6],
    seq: u8,
    rsne: Option<&[u8]>,
    mde: &[u8],
    fte: Option<(&FtElement, usize)>,
    ric: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let kck_len = kck.len();
    let seq_byte = [seq];

    let mut parts: Vec<&[u8]> = Vec::with_capacity(8);
    parts.push(spa.as_slice());
    parts.push(aa.as_slice());
    parts.push(&seq_byte);
    if let Some(r) = rsne {
        parts.push(r);
    }
    parts.push(mde);

    let fte_bytes;
    if let Some((fte, fte_kck_len)) = fte {
        fte_bytes = fte.build_with_zero_mic(fte_kck_len);
        parts.push(&fte_bytes);
    }
    if let Some(r) = ric {
        parts.push(r);
    }

    match kck_len {
        16 => {
            let mut mac = Cmac::<Aes128>::new_from_slice(kck).map_err(|_| Error::InvalidArgument)?;
            for p in &parts {
                mac.update(p);
            }
            Ok(mac.finalize().into_bytes().to_vec())
        }
        _ => {
            let mut out = HashAlg::Sha384.hmac(kck, &parts);
            out.truncate(kck_len);
            Ok(out)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ft::ie::build_mde;

    fn sample_fte(kck_len: usize) -> FtElement {
        FtElement {
            mic_element_count: 3,
            mic: vec![0u8; kck_len],
            anonce: [7u8; 32],
            snonce: [8u8; 32],
            r0khid: b"r0kh".to_vec(),
            r1khid: Some([9u8; 6]),
            gtk: None,
            igtk: None,
            oci: None,
        }
    }

    #[test]
    fn cmac_mic_is_16_bytes_and_deterministic() {
        let kck = [0x11u8; 16];
        let spa = [1u8; 6];
        let aa = [2u8; 6];
        let mde = build_mde(&[0x34, 0x12, 0x00]);
        let fte = sample_fte(16);

        let mic1 = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte, 16)), None).unwrap();
        let mic2 = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte, 16)), None).unwrap();
        assert_eq!(mic1, mic2);
        assert_eq!(mic1.len(), 16);
    }

    #[test]
    fn hmac_sha384_mic_is_truncated_to_kck_len() {
        let kck = [0x22u8; 24];
        let spa = [1u8; 6];
        let aa = [2u8; 6];
        let mde = build_mde(&[0x34, 0x12, 0x00]);
        let fte = sample_fte(24);

        let mic = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte, 24)), None).unwrap();
        assert_eq!(mic.len(), 24);
    }

    #[test]
    fn different_seq_numbers_yield_different_mics() {
        let kck = [0x11u8; 16];
        let spa = [1u8; 6];
        let aa = [2u8; 6];
        let mde = build_mde(&[0x34, 0x12, 0x00]);
        let fte = sample_fte(16);

        let mic_seq5 = calculate_fte_mic(&kck, &spa, &aa, 5, None, &mde, Some((&fte, 16)), None).unwrap();
        let mic_seq6 = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte, 16)), None).unwrap();
        assert_ne!(mic_seq5, mic_seq6);
    }

    #[test]
    fn mic_ignores_existing_mic_field_content() {
        let kck = [0x11u8; 16];
        let spa = [1u8; 6];
        let aa = [2u8; 6];
        let mde = build_mde(&[0x34, 0x12, 0x00]);
        let mut fte_dirty = sample_fte(16);
        fte_dirty.mic = vec![0xffu8; 16];
        let fte_clean = sample_fte(16);

        let mic_dirty = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte_dirty, 16)), None).unwrap();
        let mic_clean = calculate_fte_mic(&kck, &spa, &aa, 6, None, &mde, Some((&fte_clean, 16)), None).unwrap();
        assert_eq!(mic_dirty, mic_clean);
    }
}
