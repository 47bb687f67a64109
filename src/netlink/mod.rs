//! Netlink-oriented attribute codec.
//!
//! A schema-driven TLV parser/builder modeled on generic-netlink
//! attribute streams (`nla_len | nla_type | payload`, padded to 4 bytes).
//! Each attribute id maps to exactly one semantic decoder (see
//! [`AttrKind`]); the parser validates the whole requested set in one
//! pass, matching the behavior of the original `nl80211_parse_attrs`
//! helper it's grounded on.

mod attr;
mod frame;

pub use attr::{append_nested_attr, parse_attrs, AttrKind, AttrValue, NestedAttrs, ParsedAttrs, ATTR_IFINDEX, ATTR_IFNAME, ATTR_MAC};
pub use frame::{
    build_cmd_frame, build_get_key, build_new_key_group, build_set_key, build_set_station_associated, build_set_station_authorized,
    build_set_station_unauthorized,
};
