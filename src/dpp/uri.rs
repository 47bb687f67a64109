//! DPP bootstrapping URI parsing (EasyConnect 5.2.1).
//!
//! Grounded on `dpp_parse_uri`, `dpp_parse_mac`, `dpp_parse_version`,
//! `dpp_parse_key` and `dpp_parse_class_and_channel` in the original
//! source. The `DPP:(K|M|C|V|I|H):value;` token grammar, the double
//! trailing `;`, and the per-token extra validation (MAC syntax,
//! version in `{1,2}`, operating-class/channel pairs, base64+ASN.1 key)
//! are all reproduced bit-exactly.

use crate::dpp::asn1;
use crate::dpp::ecc::Curve;
use crate::error::{Error, Result};

/// One `<operating class>/<channel>` pair from a `C:` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub operating_class: u8,
    pub channel: u8,
}

impl ChannelSpec {
    /// The channel's center frequency in MHz, or `None` if the
    /// operating class/channel combination isn't recognized.
    pub fn to_frequency_mhz(self) -> Option<u32> {
        if self.operating_class == 81 {
            if self.channel == 14 {
                return Some(2484);
            }
            if (1..=13).contains(&self.channel) {
                return Some(2407 + 5 * self.channel as u32);
            }
            return None;
        }
        // Every other global operating class used here is 5 GHz.
        if self.channel == 0 {
            return None;
        }
        Some(5000 + 5 * self.channel as u32)
    }
}

/// Parsed fields of a DPP bootstrapping URI. The bootstrapping public
/// key is the only mandatory field; everything else is `None`/empty
/// when the URI omits that token.
#[derive(Clone, Debug, PartialEq)]
pub struct DppUriInfo {
    pub curve: Curve,
    pub boot_public: Vec<u8>,
    pub mac: Option<[u8; 6]>,
    pub version: Option<u8>,
    pub channels: Vec<ChannelSpec>,
    pub host: Option<String>,
    pub identifier: Option<String>,
}

fn parse_mac(token: &str) -> Result<[u8; 6]> {
    if token.len() != 12 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::BadMessage);
    }
    let mut mac = [0u8; 6];
    for i in 0..6 {
        mac[i] = u8::from_str_radix(&token[i * 2..i * 2 + 2], 16).map_err(|_| Error::BadMessage)?;
    }
    // A valid station address: not all-zero, not the broadcast address,
    // and not a multicast address (low bit of the first octet clear).
    if mac == [0; 6] || mac == [0xff; 6] || mac[0] & 0x01 != 0 {
        return Err(Error::BadMessage);
    }
    Ok(mac)
}

fn parse_version(token: &str) -> Result<u8> {
    if token.len() != 1 {
        return Err(Error::BadMessage);
    }
    match token {
        "1" => Ok(1),
        "2" => Ok(2),
        _ => Err(Error::BadMessage),
    }
}

fn parse_class_and_channel(token: &str) -> Result<Vec<ChannelSpec>> {
    let mut out = Vec::new();
    for pair in token.split(',') {
        let mut parts = pair.splitn(2, '/');
        let class_str = parts.next().ok_or(Error::BadMessage)?;
        let chan_str = parts.next().ok_or(Error::BadMessage)?;
        if class_str.starts_with(['-', '+']) || chan_str.starts_with(['-', '+']) {
            return Err(Error::BadMessage);
        }
        let operating_class: u8 = class_str.parse().map_err(|_| Error::BadMessage)?;
        let channel: u8 = chan_str.parse().map_err(|_| Error::BadMessage)?;
        let spec = ChannelSpec { operating_class, channel };
        if spec.to_frequency_mhz().is_none() {
            return Err(Error::BadMessage);
        }
        out.push(spec);
    }
    if out.is_empty() {
        return Err(Error::BadMessage);
    }
    Ok(out)
}

fn parse_key(token: &str) -> Result<(Curve, Vec<u8>)> {
    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token)
        .map_err(|_| Error::BadMessage)?;
    asn1::point_from_der(&decoded)
}

/// Parse a `DPP:...;;` bootstrapping URI.
///
/// The URI must close with exactly two semicolons (one terminating the
/// last token, one marking the end of the token list) — a single
/// trailing `;`, or more than two, both fail to parse.
pub fn parse_uri(uri: &str) -> Result<DppUriInfo> {
    let body = uri.strip_prefix("DPP:").ok_or(Error::BadMessage)?;
    if !body.ends_with(";;") {
        return Err(Error::BadMessage);
    }
    let tokens_part = &body[..body.len() - 2];
    if tokens_part.is_empty() {
        return Err(Error::BadMessage);
    }

    let mut mac = None;
    let mut version = None;
    let mut channels = Vec::new();
    let mut host = None;
    let mut identifier = None;
    let mut key = None;

    for tok in tokens_part.split(';') {
        let mut chars = tok.chars();
        let id = chars.next().ok_or(Error::BadMessage)?;
        if chars.next() != Some(':') {
            return Err(Error::BadMessage);
        }
        let value = &tok[2..];
        if value.is_empty() {
            return Err(Error::BadMessage);
        }
        match id {
            'C' => channels = parse_class_and_channel(value)?,
            'M' => mac = Some(parse_mac(value)?),
            'V' => version = Some(parse_version(value)?),
            'K' => key = Some(parse_key(value)?),
            'H' => host = Some(value.to_owned()),
            'I' => identifier = Some(value.to_owned()),
            _ => return Err(Error::BadMessage),
        }
    }

    let (curve, boot_public) = key.ok_or(Error::BadMessage)?;

    Ok(DppUriInfo {
        curve,
        boot_public,
        mac,
        version,
        channels,
        host,
        identifier,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const S1_URI: &str = "DPP:C:81/1,115/36;I:SN=4774LH2b4044;M:5254005828e5;V:2;K:MDkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDIgADURzxmttZoIRIPWGoQMV00XHWCAQIhXruVWOz0NjlkIA=;;";

    #[test]
    fn s1_parses_full_uri() {
        let info = parse_uri(S1_URI).unwrap();
        assert_eq!(info.mac, Some([0x52, 0x54, 0x00, 0x58, 0x28, 0xe5]));
        assert_eq!(info.version, Some(2));
        let freqs: Vec<u32> = info.channels.iter().filter_map(|c| c.to_frequency_mhz()).collect();
        assert!(freqs.contains(&2412));
        assert!(freqs.contains(&5180));
        assert_eq!(info.curve, Curve::P256);
        assert!(!info.boot_public.is_empty());
    }

    #[test]
    fn s2_single_closing_semicolon_fails() {
        assert!(parse_uri("DPP:K:MDkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDIgADURzxmttZoIRIPWGoQMV00XHWCAQIhXruVWOz0NjlkIA=;").is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        assert_eq!(parse_uri("K:abc;;"), Err(Error::BadMessage));
    }

    #[test]
    fn rejects_empty_token_value() {
        assert_eq!(parse_uri("DPP:M:;;"), Err(Error::BadMessage));
    }

    #[test]
    fn rejects_unknown_token() {
        assert_eq!(parse_uri("DPP:Z:foo;;"), Err(Error::BadMessage));
    }
}
