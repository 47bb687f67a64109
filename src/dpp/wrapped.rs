//! The DPP attribute TLV stream and AES-SIV wrapped-data attribute.
//!
//! Grounded on `dpp_attr_iter_init`/`dpp_attr_iter_next`/
//! `dpp_append_attr` (the flat `type(le16) | len(le16) | value` stream)
//! and `dpp_unwrap_attr`/`dpp_append_wrapped_data` (AES-SIV over a
//! caller-supplied list of attributes, using the frame-specific AD0/AD1
//! components called for in EasyConnect 6.3.1.4/6.4.1).

use aes_siv::siv::{Aes128Siv, Aes256Siv};
use aes_siv::KeyInit;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Wire id of the DPP Wrapped Data attribute, per the Easy Connect
/// attribute ID table (WFA-assigned).
pub const ATTR_WRAPPED_DATA: u16 = 0x1e;

/// One `(type, value)` attribute read out of a flat DPP attribute stream.
pub struct DppAttrIter<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DppAttrIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        DppAttrIter { buf, pos: 0 }
    }
}

impl<'a> Iterator for DppAttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 4 > self.buf.len() {
            return None;
        }
        let typ = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        let len = u16::from_le_bytes([self.buf[self.pos + 2], self.buf[self.pos + 3]]) as usize;
        let data_start = self.pos + 4;
        if data_start + len > self.buf.len() {
            // Truncated final attribute: stop, same as the original
            // iterator returning false rather than signalling an error.
            self.pos = self.buf.len();
            return None;
        }
        let data = &self.buf[data_start..data_start + len];
        self.pos = data_start + len;
        Some((typ, data))
    }
}

/// Find the first attribute of type `typ` in a flat attribute stream.
pub fn find_attr(buf: &[u8], typ: u16) -> Option<&[u8]> {
    DppAttrIter::new(buf).find(|(t, _)| *t == typ).map(|(_, v)| v)
}

/// Append one `(type, value)` attribute to `out`.
pub fn append_attr(out: &mut Vec<u8>, typ: u16, value: &[u8]) {
    out.extend_from_slice(&typ.to_le_bytes());
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
}

/// A decrypted wrapped-data attribute stream. Zeroized on drop, per the
/// resource-lifetime guarantee that wrapped-attribute plaintext buffers
/// don't outlive their owner in cleartext.
#[derive(ZeroizeOnDrop)]
pub struct WrappedPlaintext(Vec<u8>);

impl WrappedPlaintext {
    /// Iterate over the `(type, value)` attributes carried inside.
    pub fn attrs(&self) -> DppAttrIter<'_> {
        DppAttrIter::new(&self.0)
    }
}

/// Concatenate `(type, value)` attribute pairs into one flat plaintext
/// attribute stream (the SIV payload before encryption).
fn encode_attrs(attrs: &[(u16, &[u8])]) -> Vec<u8> {
    let total: usize = attrs.iter().map(|(_, v)| 4 + v.len()).sum();
    let mut out = Vec::with_capacity(total);
    for (typ, value) in attrs {
        append_attr(&mut out, *typ, value);
    }
    out
}

fn siv_encrypt(key: &[u8], ad: &[&[u8]], plaintext: &[u8]) -> Result<Vec<u8>> {
    match key.len() {
        32 => {
            let mut siv = Aes128Siv::new(key.into());
            siv.encrypt(ad, plaintext).map_err(|_| Error::InvalidArgument)
        }
        64 => {
            let mut siv = Aes256Siv::new(key.into());
            siv.encrypt(ad, plaintext).map_err(|_| Error::InvalidArgument)
        }
        _ => Err(Error::Unsupported),
    }
}

fn siv_decrypt(key: &[u8], ad: &[&[u8]], ciphertext: &[u8]) -> Result<Vec<u8>> {
    match key.len() {
        32 => {
            let mut siv = Aes128Siv::new(key.into());
            siv.decrypt(ad, ciphertext).map_err(|_| Error::BadMessage)
        }
        64 => {
            let mut siv = Aes256Siv::new(key.into());
            siv.decrypt(ad, ciphertext).map_err(|_| Error::BadMessage)
        }
        _ => Err(Error::Unsupported),
    }
}

/// Build a complete Wrapped Data attribute (type + length + ciphertext)
/// wrapping `attrs` under `key`, bound to the frame-specific `ad0`/`ad1`.
///
/// `to_len` is the capacity of the buffer the caller intends to append
/// this attribute into; unlike the original, which silently returned 0
/// on overflow, a too-small buffer is an explicit [`Error::InvalidArgument`].
pub fn append_wrapped_data(ad0: Option<&[u8]>, ad1: Option<&[u8]>, to_len: usize, key: &[u8], attrs: &[(u16, &[u8])]) -> Result<Vec<u8>> {
    let mut plaintext = encode_attrs(attrs);
    if to_len < plaintext.len() + 4 + 16 {
        return Err(Error::InvalidArgument);
    }

    let mut ad: Vec<&[u8]> = Vec::with_capacity(2);
    if let Some(a) = ad0 {
        ad.push(a);
    }
    if let Some(a) = ad1 {
        ad.push(a);
    }

    let ciphertext = siv_encrypt(key, &ad, &plaintext)?;
    plaintext.zeroize();

    let mut out = Vec::with_capacity(4 + ciphertext.len());
    append_attr(&mut out, ATTR_WRAPPED_DATA, &ciphertext);
    Ok(out)
}

/// Decrypt a Wrapped Data attribute's ciphertext back to its flat
/// attribute stream.
pub fn unwrap_attr(ad0: Option<&[u8]>, ad1: Option<&[u8]>, key: &[u8], wrapped: &[u8]) -> Result<WrappedPlaintext> {
    let mut ad: Vec<&[u8]> = Vec::with_capacity(2);
    if let Some(a) = ad0 {
        ad.push(a);
    }
    if let Some(a) = ad1 {
        ad.push(a);
    }
    siv_decrypt(key, &ad, wrapped).map(WrappedPlaintext)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attr_stream_round_trips() {
        let mut buf = Vec::new();
        append_attr(&mut buf, 1, b"hello");
        append_attr(&mut buf, 2, b"world!");
        let attrs: Vec<_> = DppAttrIter::new(&buf).collect();
        assert_eq!(attrs, vec![(1u16, b"hello".as_slice()), (2u16, b"world!".as_slice())]);
    }

    #[test]
    fn truncated_final_attribute_stops_iteration() {
        let mut buf = Vec::new();
        append_attr(&mut buf, 1, b"hello");
        buf.extend_from_slice(&3u16.to_le_bytes());
        buf.extend_from_slice(&100u16.to_le_bytes());
        // No payload bytes follow for the declared length of 100.
        let attrs: Vec<_> = DppAttrIter::new(&buf).collect();
        assert_eq!(attrs, vec![(1u16, b"hello".as_slice())]);
    }

    #[test]
    fn wrapped_data_round_trips() {
        let key = [0x42u8; 32];
        let ad0 = b"ad0-bytes";
        let attrs = [(7u16, b"secret".as_slice())];
        let wrapped = append_wrapped_data(Some(ad0), None, 4096, &key, &attrs).unwrap();
        let (typ, ciphertext) = DppAttrIter::new(&wrapped).next().unwrap();
        assert_eq!(typ, ATTR_WRAPPED_DATA);

        let plaintext = unwrap_attr(Some(ad0), None, &key, ciphertext).unwrap();
        let decoded: Vec<_> = plaintext.attrs().collect();
        assert_eq!(decoded, vec![(7u16, b"secret".as_slice())]);
    }

    #[test]
    fn open_question_buffer_too_small_is_invalid_argument() {
        let key = [0x42u8; 32];
        let attrs = [(7u16, b"secret".as_slice())];
        assert_eq!(
            append_wrapped_data(None, None, 4, &key, &attrs),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn wrong_ad_fails_to_decrypt() {
        let key = [0x42u8; 32];
        let attrs = [(7u16, b"secret".as_slice())];
        let wrapped = append_wrapped_data(Some(b"right-ad"), None, 4096, &key, &attrs).unwrap();
        let (_, ciphertext) = DppAttrIter::new(&wrapped).next().unwrap();
        assert!(unwrap_attr(Some(b"wrong-ad"), None, &key, ciphertext).is_err());
    }
}
