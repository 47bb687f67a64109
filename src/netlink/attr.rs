//! Typed attribute decoding over a flat `nlattr` stream.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, NativeEndian};

use crate::error::{Error, Result};

const NLA_F_NESTED: u16 = 0x8000;
const NLA_F_NET_BYTEORDER: u16 = 0x4000;
const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);
const NLA_HDRLEN: usize = 4;

/// Illustrative top-level attribute ids this crate's schema and build
/// helpers share, named rather than left as inline magic numbers.
pub const ATTR_IFINDEX: u16 = 3;
pub const ATTR_IFNAME: u16 = 4;
pub const ATTR_MAC: u16 = 6;

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// The semantic decoding applied to one attribute id's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrKind {
    /// `u32`, rejected if zero.
    Ifindex,
    /// 6-byte station address.
    Mac,
    /// Nul-terminated interface/device name.
    Name,
    /// Exactly 2 printable chars plus a trailing nul (3 bytes on the wire).
    CountryCode,
    /// Little/native-endian `u32`.
    U32,
    /// Little/native-endian `u64`.
    U64,
    /// Presence-only boolean; the payload must be empty.
    Flag,
    /// Opaque variable-length byte slice.
    Iovec,
    /// A container of further attributes.
    Nested,
}

/// A decoded attribute value, tagged by the [`AttrKind`] that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// See [`AttrKind::Ifindex`].
    Ifindex(u32),
    /// See [`AttrKind::Mac`].
    Mac([u8; 6]),
    /// See [`AttrKind::Name`].
    Name(String),
    /// See [`AttrKind::CountryCode`].
    CountryCode([u8; 2]),
    /// See [`AttrKind::U32`].
    U32(u32),
    /// See [`AttrKind::U64`].
    U64(u64),
    /// See [`AttrKind::Flag`].
    Flag(bool),
    /// See [`AttrKind::Iovec`].
    Iovec(Vec<u8>),
    /// See [`AttrKind::Nested`]; callers recurse with [`parse_attrs`] on
    /// the inner bytes, or walk it with [`NestedAttrs`].
    Nested(Vec<u8>),
}

/// Result of a [`parse_attrs`] call: one entry per requested id.
pub type ParsedAttrs = BTreeMap<u16, AttrValue>;

/// Look up the fixed decoder for a known attribute id.
///
/// This crate carries a small illustrative schema rather than the full
/// `nl80211` attribute space (out of scope per the Non-goals around the
/// wiphy inventory and netdev ioctl wrappers) — callers extend this
/// function for additional ids their build helpers need.
fn kind_for_id(id: u16) -> Option<AttrKind> {
    match id {
        ATTR_IFINDEX => Some(AttrKind::Ifindex),
        ATTR_MAC => Some(AttrKind::Mac),
        ATTR_IFNAME => Some(AttrKind::Name),
        254 => Some(AttrKind::CountryCode),
        u32_id if u32_id == U32_PROBE_ID => Some(AttrKind::U32),
        u64_id if u64_id == U64_PROBE_ID => Some(AttrKind::U64),
        9 => Some(AttrKind::Flag),
        7 => Some(AttrKind::Iovec),
        nested_id if nested_id == NESTED_PROBE_ID => Some(AttrKind::Nested),
        _ => None,
    }
}

// Symbolic placeholders for the two numeric-scalar/nested ids; kept as
// constants rather than inline magic numbers used twice.
const U32_PROBE_ID: u16 = 100;
const U64_PROBE_ID: u16 = 101;
const NESTED_PROBE_ID: u16 = 200;

struct AttrIter<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = std::result::Result<(u16, &'a [u8]), ()>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + NLA_HDRLEN > self.buf.len() {
            return None;
        }
        let nla_len = NativeEndian::read_u16(&self.buf[self.pos..]) as usize;
        let nla_type = NativeEndian::read_u16(&self.buf[self.pos + 2..]);
        if nla_len < NLA_HDRLEN || self.pos + nla_len > self.buf.len() {
            self.pos = self.buf.len();
            return Some(Err(()));
        }
        let payload = &self.buf[self.pos + NLA_HDRLEN..self.pos + nla_len];
        self.pos += align4(nla_len);
        Some(Ok((nla_type & NLA_TYPE_MASK, payload)))
    }
}

fn decode(kind: AttrKind, payload: &[u8]) -> Result<AttrValue> {
    match kind {
        AttrKind::Ifindex => {
            if payload.len() != 4 {
                return Err(Error::InvalidArgument);
            }
            let v = NativeEndian::read_u32(payload);
            if v == 0 {
                return Err(Error::InvalidArgument);
            }
            Ok(AttrValue::Ifindex(v))
        }
        AttrKind::Mac => {
            if payload.len() != 6 {
                return Err(Error::InvalidArgument);
            }
            let mut mac = [0u8; 6];
            mac.copy_from_slice(payload);
            Ok(AttrValue::Mac(mac))
        }
        AttrKind::Name => {
            let end = payload.iter().position(|&b| b == 0).ok_or(Error::InvalidArgument)?;
            let name = std::str::from_utf8(&payload[..end])?.to_owned();
            Ok(AttrValue::Name(name))
        }
        AttrKind::CountryCode => {
            if payload.len() != 3 || payload[2] != 0 {
                return Err(Error::InvalidArgument);
            }
            Ok(AttrValue::CountryCode([payload[0], payload[1]]))
        }
        AttrKind::U32 => {
            if payload.len() != 4 {
                return Err(Error::InvalidArgument);
            }
            Ok(AttrValue::U32(NativeEndian::read_u32(payload)))
        }
        AttrKind::U64 => {
            if payload.len() != 8 {
                return Err(Error::InvalidArgument);
            }
            Ok(AttrValue::U64(NativeEndian::read_u64(payload)))
        }
        AttrKind::Flag => {
            if !payload.is_empty() {
                return Err(Error::InvalidArgument);
            }
            Ok(AttrValue::Flag(true))
        }
        AttrKind::Iovec => Ok(AttrValue::Iovec(payload.to_vec())),
        AttrKind::Nested => Ok(AttrValue::Nested(payload.to_vec())),
    }
}

/// Parse `msg` and return values for each requested attribute id.
///
/// Behavior (see the attribute codec section of the governing spec):
/// - an id in `wanted` absent from [`kind_for_id`]'s schema → [`Error::NotSupported`]
/// - the same id occurring twice in `msg` → [`Error::AlreadyPresent`]
/// - an id in `wanted` absent from `msg` → [`Error::NotFound`], except
///   flag-typed ids, which decode to `AttrValue::Flag(false)`
/// - a present attribute whose payload the decoder rejects → [`Error::InvalidArgument`]
pub fn parse_attrs(msg: &[u8], wanted: &[u16]) -> Result<ParsedAttrs> {
    let mut kinds = BTreeMap::new();
    for &id in wanted {
        let kind = kind_for_id(id).ok_or_else(|| {
            log::warn!("netlink attribute id {id} has no registered decoder");
            Error::NotSupported
        })?;
        kinds.insert(id, kind);
    }

    let mut out = ParsedAttrs::new();
    for item in (AttrIter { buf: msg, pos: 0 }) {
        let (id, payload) = item.map_err(|_| Error::InvalidArgument)?;
        let Some(&kind) = kinds.get(&id) else {
            continue;
        };
        if out.contains_key(&id) {
            return Err(Error::AlreadyPresent);
        }
        out.insert(id, decode(kind, payload)?);
    }

    for (&id, &kind) in &kinds {
        if out.contains_key(&id) {
            continue;
        }
        if kind == AttrKind::Flag {
            out.insert(id, AttrValue::Flag(false));
        } else {
            return Err(Error::NotFound);
        }
    }

    Ok(out)
}

/// A read-only cursor over a nested attribute's inner TLV stream.
///
/// Grounded on the `AttrHandle` traversal pattern: a lightweight
/// borrowed view that yields `(id, payload)` pairs without copying the
/// underlying buffer, used by nested decoders and by build helpers that
/// need to inspect a container they just built.
pub struct NestedAttrs<'a> {
    buf: &'a [u8],
}

impl<'a> NestedAttrs<'a> {
    /// Wrap a nested attribute's raw payload for traversal.
    pub fn new(buf: &'a [u8]) -> Self {
        NestedAttrs { buf }
    }

    /// Iterate over the `(id, payload)` pairs in this container.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'a [u8])> + 'a {
        (AttrIter { buf: self.buf, pos: 0 }).filter_map(|r| r.ok())
    }

    /// Find the first attribute with the given id.
    pub fn get(&self, id: u16) -> Option<&'a [u8]> {
        self.iter().find(|(i, _)| *i == id).map(|(_, p)| p)
    }
}

/// Append one attribute (header + payload + padding) to `out`.
pub fn append_attr(out: &mut Vec<u8>, id: u16, payload: &[u8]) {
    let nla_len = (NLA_HDRLEN + payload.len()) as u16;
    let mut hdr = [0u8; NLA_HDRLEN];
    NativeEndian::write_u16(&mut hdr[0..2], nla_len);
    NativeEndian::write_u16(&mut hdr[2..4], id);
    out.extend_from_slice(&hdr);
    out.extend_from_slice(payload);
    let padded = align4(out.len());
    out.resize(padded, 0);
}

/// Append a container attribute: `id` with `NLA_F_NESTED` set, wrapping
/// an already-built inner TLV stream (`enter_nested`/`leave_nested` in
/// the original message-building helpers collapse to this one call).
pub fn append_nested_attr(out: &mut Vec<u8>, id: u16, inner: &[u8]) {
    append_attr(out, id | NLA_F_NESTED, inner);
}
