//! Outgoing frame command builder and nested-attribute message builders.
//!
//! Grounded on `nl80211_build_set_key`/`nl80211_build_get_key`/
//! `nl80211_build_new_key_group`/`nl80211_build_set_station_*` and
//! `nl80211_build_cmd_frame` in `nl80211util.c`. The attribute ids below
//! are this crate's own illustrative schema (see the disclaimer on
//! [`crate::netlink::attr`]'s `kind_for_id`), not real `nl80211.h`
//! values — `l_genl_msg_enter_nested`/`leave_nested` collapse to one
//! [`append_nested_attr`] call per key/flag block.

use byteorder::{ByteOrder, NativeEndian};

use crate::netlink::attr::{append_attr, append_nested_attr, ATTR_IFINDEX, ATTR_MAC};

const ATTR_KEY: u16 = 20;
const ATTR_KEY_IDX: u16 = 21;
const ATTR_STA_FLAGS2: u16 = 22;

const KEY_DATA: u16 = 1;
const KEY_CIPHER: u16 = 2;
const KEY_IDX: u16 = 3;
const KEY_SEQ: u16 = 4;
const KEY_TYPE: u16 = 5;
const KEY_DEFAULT: u16 = 6;
const KEY_DEFAULT_TYPES: u16 = 7;
const KEY_DEFAULT_TYPE_MULTICAST: u16 = 8;

const KEY_TYPE_GROUP: u32 = 1;

const STA_FLAG_AUTHORIZED: u32 = 1 << 0;
const STA_FLAG_AUTHENTICATED: u32 = 1 << 1;
const STA_FLAG_ASSOCIATED: u32 = 1 << 2;

fn u32_attr(v: u32) -> [u8; 4] {
    let mut b = [0u8; 4];
    NativeEndian::write_u32(&mut b, v);
    b
}

/// `SET_KEY`: mark `key_index` on `ifindex` as the default key, used for
/// multicast. Grounded on `nl80211_build_set_key`.
pub fn build_set_key(ifindex: u32, key_index: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    append_attr(&mut out, ATTR_IFINDEX, &u32_attr(ifindex));

    let mut key = Vec::with_capacity(16);
    append_attr(&mut key, KEY_IDX, &[key_index]);
    append_attr(&mut key, KEY_DEFAULT, &[]);

    let mut default_types = Vec::with_capacity(4);
    append_attr(&mut default_types, KEY_DEFAULT_TYPE_MULTICAST, &[]);
    append_nested_attr(&mut key, KEY_DEFAULT_TYPES, &default_types);

    append_nested_attr(&mut out, ATTR_KEY, &key);
    out
}

/// `GET_KEY`: request the current sequence counter for `key_index` on
/// `ifindex`. Grounded on `nl80211_build_get_key`.
pub fn build_get_key(ifindex: u32, key_index: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    append_attr(&mut out, ATTR_IFINDEX, &u32_attr(ifindex));
    append_attr(&mut out, ATTR_KEY_IDX, &[key_index]);
    out
}

/// `NEW_KEY`: install a group key, optionally scoped to `addr` (absent
/// for a broadcast/multicast GTK/IGTK) and with an optional starting
/// receive sequence counter. Grounded on `nl80211_build_new_key_group`.
pub fn build_new_key_group(ifindex: u32, cipher: u32, key_id: u8, key: &[u8], seq: Option<&[u8]>, addr: Option<&[u8; 6]>) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + key.len());
    append_attr(&mut out, ATTR_IFINDEX, &u32_attr(ifindex));
    if let Some(addr) = addr {
        append_attr(&mut out, ATTR_MAC, addr);
    }

    let mut block = Vec::with_capacity(32 + key.len());
    append_attr(&mut block, KEY_DATA, key);
    append_attr(&mut block, KEY_CIPHER, &u32_attr(cipher));
    append_attr(&mut block, KEY_IDX, &[key_id]);
    if let Some(seq) = seq {
        append_attr(&mut block, KEY_SEQ, seq);
    }
    append_attr(&mut block, KEY_TYPE, &u32_attr(KEY_TYPE_GROUP));

    let mut default_types = Vec::with_capacity(4);
    append_attr(&mut default_types, KEY_DEFAULT_TYPE_MULTICAST, &[]);
    append_nested_attr(&mut block, KEY_DEFAULT_TYPES, &default_types);

    append_nested_attr(&mut out, ATTR_KEY, &block);
    out
}

fn build_set_station(ifindex: u32, addr: &[u8; 6], mask: u32, set: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    append_attr(&mut out, ATTR_IFINDEX, &u32_attr(ifindex));
    append_attr(&mut out, ATTR_MAC, addr);

    let mut flags = Vec::with_capacity(8);
    flags.extend_from_slice(&u32_attr(mask));
    flags.extend_from_slice(&u32_attr(set));
    append_attr(&mut out, ATTR_STA_FLAGS2, &flags);
    out
}

/// `SET_STATION`: mark the AP/station at `addr` authorized (4-way
/// handshake / FT complete, controlled port may open). Grounded on
/// `nl80211_build_set_station_authorized`.
pub fn build_set_station_authorized(ifindex: u32, addr: &[u8; 6]) -> Vec<u8> {
    build_set_station(ifindex, addr, STA_FLAG_AUTHORIZED, STA_FLAG_AUTHORIZED)
}

/// `SET_STATION`: mark `addr` authenticated and associated. Grounded on
/// `nl80211_build_set_station_associated`.
pub fn build_set_station_associated(ifindex: u32, addr: &[u8; 6]) -> Vec<u8> {
    let mask = STA_FLAG_AUTHENTICATED | STA_FLAG_ASSOCIATED;
    build_set_station(ifindex, addr, mask, mask)
}

/// `SET_STATION`: clear the authorized flag on `addr` (controlled port
/// closes). Grounded on `nl80211_build_set_station_unauthorized`.
pub fn build_set_station_unauthorized(ifindex: u32, addr: &[u8; 6]) -> Vec<u8> {
    build_set_station(ifindex, addr, STA_FLAG_AUTHORIZED, 0)
}

/// Prepend a 24-byte 802.11 header to `body` and return the full frame.
///
/// Layout matches `nl80211_build_cmd_frame`: little-endian frame-control
/// word at offset 0, destination address at offset 4, source address at
/// offset 10, and the destination address repeated (as BSSID) at offset
/// 16 — the minimal header shape an AP-addressed management/action frame
/// needs; sequence control and the rest of the header are left to the
/// driver.
pub fn build_cmd_frame(frame_type: u16, src: &[u8; 6], dest: &[u8; 6], body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(24 + body.len());
    frame.extend_from_slice(&frame_type.to_le_bytes());
    frame.extend_from_slice(dest);
    frame.extend_from_slice(src);
    frame.extend_from_slice(dest);
    frame.extend_from_slice(body);
    frame
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::netlink::attr::NestedAttrs;

    #[test]
    fn header_layout() {
        let src = [1, 2, 3, 4, 5, 6];
        let dest = [0x52, 0x54, 0x00, 0x58, 0x28, 0xe5];
        let frame = build_cmd_frame(0x00d0, &src, &dest, &[0xaa, 0xbb]);
        assert_eq!(&frame[0..2], &0x00d0u16.to_le_bytes());
        assert_eq!(&frame[4..10], &dest);
        assert_eq!(&frame[10..16], &src);
        assert_eq!(&frame[16..22], &dest);
        assert_eq!(&frame[22..24], &[0xaa, 0xbb]);
    }

    #[test]
    fn set_key_nests_idx_and_default_types() {
        let msg = build_set_key(7, 2);
        let top = NestedAttrs::new(&msg);
        assert_eq!(top.get(ATTR_IFINDEX), Some(u32_attr(7).as_slice()));

        let key = NestedAttrs::new(top.get(ATTR_KEY).unwrap());
        assert_eq!(key.get(KEY_IDX), Some([2u8].as_slice()));
        assert_eq!(key.get(KEY_DEFAULT), Some(b"".as_slice()));

        let default_types = NestedAttrs::new(key.get(KEY_DEFAULT_TYPES).unwrap());
        assert_eq!(default_types.get(KEY_DEFAULT_TYPE_MULTICAST), Some(b"".as_slice()));
    }

    #[test]
    fn get_key_carries_top_level_idx() {
        let msg = build_get_key(7, 3);
        let top = NestedAttrs::new(&msg);
        assert_eq!(top.get(ATTR_IFINDEX), Some(u32_attr(7).as_slice()));
        assert_eq!(top.get(ATTR_KEY_IDX), Some([3u8].as_slice()));
    }

    #[test]
    fn new_key_group_nests_key_data_cipher_and_seq() {
        let addr = [9u8; 6];
        let msg = build_new_key_group(7, 0x000fac04, 1, b"thekey", Some(&[0u8; 6]), Some(&addr));
        let top = NestedAttrs::new(&msg);
        assert_eq!(top.get(ATTR_MAC), Some(addr.as_slice()));

        let key = NestedAttrs::new(top.get(ATTR_KEY).unwrap());
        assert_eq!(key.get(KEY_DATA), Some(b"thekey".as_slice()));
        assert_eq!(key.get(KEY_CIPHER), Some(u32_attr(0x000fac04).as_slice()));
        assert_eq!(key.get(KEY_SEQ), Some([0u8; 6].as_slice()));
    }

    #[test]
    fn set_station_variants_set_expected_flag_bits() {
        let addr = [4u8; 6];

        let authorized_buf = build_set_station_authorized(1, &addr);
        let authorized = NestedAttrs::new(&authorized_buf);
        let flags = authorized.get(ATTR_STA_FLAGS2).unwrap();
        assert_eq!(NativeEndian::read_u32(&flags[0..4]), STA_FLAG_AUTHORIZED);
        assert_eq!(NativeEndian::read_u32(&flags[4..8]), STA_FLAG_AUTHORIZED);

        let unauthorized_buf = build_set_station_unauthorized(1, &addr);
        let unauthorized = NestedAttrs::new(&unauthorized_buf);
        let flags = unauthorized.get(ATTR_STA_FLAGS2).unwrap();
        assert_eq!(NativeEndian::read_u32(&flags[0..4]), STA_FLAG_AUTHORIZED);
        assert_eq!(NativeEndian::read_u32(&flags[4..8]), 0);

        let associated_buf = build_set_station_associated(1, &addr);
        let associated = NestedAttrs::new(&associated_buf);
        let flags = associated.get(ATTR_STA_FLAGS2).unwrap();
        let expect = STA_FLAG_AUTHENTICATED | STA_FLAG_ASSOCIATED;
        assert_eq!(NativeEndian::read_u32(&flags[0..4]), expect);
        assert_eq!(NativeEndian::read_u32(&flags[4..8]), expect);
    }
}
