//! Minimal IEEE 802.11 information-element codecs needed by the FT
//! handshake: the RSN Element (9.4.2.24), Mobility Domain Element
//! (9.4.2.47) and Fast BSS Transition Element (9.4.2.48).
//!
//! Grounded on `ie_parse_rsne_from_data`/`ie_build_rsne` and
//! `ie_parse_fast_bss_transition_from_data`/`ie_build_fast_bss_transition`
//! as used from `ft.c`; only the fields the FT core actually inspects or
//! rewrites are modeled, with cipher/AKM suite lists and key-wrap payloads
//! carried as opaque bytes.

use crate::error::{Error, Result};

pub const IE_TYPE_RSN: u8 = 48;
pub const IE_TYPE_MOBILITY_DOMAIN: u8 = 54;
pub const IE_TYPE_FAST_BSS_TRANSITION: u8 = 55;

/// RSN Capabilities bit for Operating Channel Validation Capable.
const RSN_CAPS_OCVC: u16 = 0x4000;

/// FTE sub-element ids (802.11-2020 Table 9-222).
const SUBELEM_R1KH_ID: u8 = 1;
const SUBELEM_GTK: u8 = 2;
const SUBELEM_R0KH_ID: u8 = 3;
const SUBELEM_IGTK: u8 = 4;
const SUBELEM_OCI: u8 = 5;

/// Iterate over a concatenated stream of 802.11 `tag | len | value` IEs,
/// stopping silently at the first truncated element.
pub struct IeIter<'a> {
    buf: &'a [u8],
}

impl<'a> IeIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        IeIter { buf }
    }
}

impl<'a> Iterator for IeIter<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < 2 {
            return None;
        }
        let tag = self.buf[0];
        let len = self.buf[1] as usize;
        if self.buf.len() < 2 + len {
            return None;
        }
        let body = &self.buf[2..2 + len];
        self.buf = &self.buf[2 + len..];
        Some((tag, body))
    }
}

fn push_element(out: &mut Vec<u8>, tag: u8, body: &[u8]) {
    out.push(tag);
    out.push(body.len() as u8);
    out.extend_from_slice(body);
}

/// A parsed Robust Security Network Element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsnElement {
    pub version: u16,
    pub group_cipher: [u8; 4],
    pub pairwise_ciphers: Vec<[u8; 4]>,
    pub akm_suites: Vec<[u8; 4]>,
    pub rsn_capabilities: u16,
    pub pmkids: Vec<[u8; 16]>,
    pub group_management_cipher: Option<[u8; 4]>,
}

impl RsnElement {
    /// Parse the body (tag and length already stripped) of an RSNE.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < 2 {
            return Err(Error::BadMessage);
        }
        let version = u16::from_le_bytes([body[0], body[1]]);
        let mut pos = 2;

        if body.len() < pos + 4 {
            return Err(Error::BadMessage);
        }
        let group_cipher: [u8; 4] = body[pos..pos + 4].try_into()?;
        pos += 4;

        let pairwise_ciphers = read_suite_list(body, &mut pos)?;
        let akm_suites = read_suite_list(body, &mut pos)?;

        let mut rsn_capabilities = 0u16;
        if body.len() >= pos + 2 {
            rsn_capabilities = u16::from_le_bytes([body[pos], body[pos + 1]]);
            pos += 2;
        }

        let mut pmkids = Vec::new();
        if body.len() >= pos + 2 {
            let count = u16::from_le_bytes([body[pos], body[pos + 1]]) as usize;
            pos += 2;
            if body.len() < pos + 16 * count {
                return Err(Error::BadMessage);
            }
            for i in 0..count {
                let pmkid: [u8; 16] = body[pos + i * 16..pos + i * 16 + 16].try_into()?;
                pmkids.push(pmkid);
            }
            pos += 16 * count;
        }

        let group_management_cipher = if body.len() >= pos + 4 {
            Some(body[pos..pos + 4].try_into()?)
        } else {
            None
        };

        Ok(RsnElement {
            version,
            group_cipher,
            pairwise_ciphers,
            akm_suites,
            rsn_capabilities,
            pmkids,
            group_management_cipher,
        })
    }

    /// Encode back to a complete `tag | len | body` element.
    pub fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.version.to_le_bytes());
        body.extend_from_slice(&self.group_cipher);
        write_suite_list(&mut body, &self.pairwise_ciphers);
        write_suite_list(&mut body, &self.akm_suites);
        body.extend_from_slice(&self.rsn_capabilities.to_le_bytes());
        body.extend_from_slice(&(self.pmkids.len() as u16).to_le_bytes());
        for p in &self.pmkids {
            body.extend_from_slice(p);
        }
        if let Some(gmc) = self.group_management_cipher {
            body.extend_from_slice(&gmc);
        }
        let mut out = Vec::with_capacity(2 + body.len());
        push_element(&mut out, IE_TYPE_RSN, &body);
        out
    }

    pub fn ocvc(&self) -> bool {
        self.rsn_capabilities & RSN_CAPS_OCVC != 0
    }

    pub fn set_ocvc(&mut self, value: bool) {
        if value {
            self.rsn_capabilities |= RSN_CAPS_OCVC;
        } else {
            self.rsn_capabilities &= !RSN_CAPS_OCVC;
        }
    }

    /// True iff every field but the PMKID list matches — what 12.8.x
    /// requires when comparing a rebuilt RSNE to the one advertised by
    /// the AP in Beacon/Probe Response.
    pub fn non_pmkid_fields_equal(&self, other: &RsnElement) -> bool {
        self.version == other.version
            && self.group_cipher == other.group_cipher
            && self.pairwise_ciphers == other.pairwise_ciphers
            && self.akm_suites == other.akm_suites
            && self.rsn_capabilities == other.rsn_capabilities
            && self.group_management_cipher == other.group_management_cipher
    }
}

fn read_suite_list(body: &[u8], pos: &mut usize) -> Result<Vec<[u8; 4]>> {
    if body.len() < *pos + 2 {
        return Err(Error::BadMessage);
    }
    let count = u16::from_le_bytes([body[*pos], body[*pos + 1]]) as usize;
    *pos += 2;
    if body.len() < *pos + 4 * count {
        return Err(Error::BadMessage);
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(body[*pos + i * 4..*pos + i * 4 + 4].try_into()?);
    }
    *pos += 4 * count;
    Ok(out)
}

fn write_suite_list(body: &mut Vec<u8>, suites: &[[u8; 4]]) {
    body.extend_from_slice(&(suites.len() as u16).to_le_bytes());
    for s in suites {
        body.extend_from_slice(s);
    }
}

/// Build a Mobility Domain Element (3-byte body: MDID + FT capability and
/// policy) from its already-known body bytes.
pub fn build_mde(body: &[u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    push_element(&mut out, IE_TYPE_MOBILITY_DOMAIN, body);
    out
}

/// Two MDE IEs, each including their tag and length byte, are equal iff
/// they are byte-identical end to end.
///
/// The original source's `mde_equal` compares its first argument against
/// itself (`memcmp(mde1, mde1, ...)`), which is always true when both
/// pointers are non-null — a latent bug. This compares the two arguments
/// against each other, as 12.8.3 actually requires.
pub fn mde_equal(mde1: &[u8], mde2: &[u8]) -> bool {
    mde1 == mde2
}

/// An optional, opaque GTK sub-element payload as carried in an FTE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GtkSubelem {
    pub key_id: u8,
    pub rsc: [u8; 8],
    pub wrapped_key: Vec<u8>,
}

/// An optional, opaque IGTK sub-element payload as carried in an FTE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgtkSubelem {
    pub key_id: u16,
    pub ipn: [u8; 6],
    pub wrapped_key: Vec<u8>,
}

/// A parsed Fast BSS Transition Element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtElement {
    pub mic_element_count: u8,
    pub mic: Vec<u8>,
    pub anonce: [u8; 32],
    pub snonce: [u8; 32],
    pub r0khid: Vec<u8>,
    pub r1khid: Option<[u8; 6]>,
    pub gtk: Option<GtkSubelem>,
    pub igtk: Option<IgtkSubelem>,
    pub oci: Option<[u8; 5]>,
}

impl FtElement {
    /// Parse the body (tag and length stripped) of an FTE, given the
    /// handshake's KCK length (the MIC field's width).
    pub fn parse(body: &[u8], kck_len: usize) -> Result<Self> {
        if body.len() < 2 + kck_len + 64 {
            return Err(Error::BadMessage);
        }
        let mic_element_count = body[1];
        let mic = body[2..2 + kck_len].to_vec();
        let mut pos = 2 + kck_len;
        let anonce: [u8; 32] = body[pos..pos + 32].try_into()?;
        pos += 32;
        let snonce: [u8; 32] = body[pos..pos + 32].try_into()?;
        pos += 32;

        let mut r0khid = Vec::new();
        let mut r1khid = None;
        let mut gtk = None;
        let mut igtk = None;
        let mut oci = None;

        for (id, value) in IeIter::new(&body[pos..]) {
            match id {
                SUBELEM_R0KH_ID => r0khid = value.to_vec(),
                SUBELEM_R1KH_ID => {
                    r1khid = Some(<[u8; 6]>::try_from(value).map_err(|_| Error::BadMessage)?)
                }
                SUBELEM_GTK => {
                    if value.len() < 11 {
                        return Err(Error::BadMessage);
                    }
                    gtk = Some(GtkSubelem {
                        key_id: value[0] & 0x03,
                        rsc: value[2..10].try_into()?,
                        wrapped_key: value[10..].to_vec(),
                    });
                }
                SUBELEM_IGTK => {
                    if value.len() < 9 {
                        return Err(Error::BadMessage);
                    }
                    igtk = Some(IgtkSubelem {
                        key_id: u16::from_le_bytes([value[0], value[1]]),
                        ipn: value[2..8].try_into()?,
                        wrapped_key: value[9..].to_vec(),
                    });
                }
                SUBELEM_OCI => {
                    oci = Some(<[u8; 5]>::try_from(value).map_err(|_| Error::BadMessage)?)
                }
                _ => {}
            }
        }

        Ok(FtElement {
            mic_element_count,
            mic,
            anonce,
            snonce,
            r0khid,
            r1khid,
            gtk,
            igtk,
            oci,
        })
    }

    /// Encode back to a complete `tag | len | body` element.
    pub fn build(&self, kck_len: usize) -> Vec<u8> {
        let mut body = Vec::with_capacity(2 + kck_len + 64);
        body.push(0);
        body.push(self.mic_element_count);
        body.extend_from_slice(&self.mic);
        if self.mic.len() < kck_len {
            body.extend(std::iter::repeat(0u8).take(kck_len - self.mic.len()));
        }
        body.extend_from_slice(&self.anonce);
        body.extend_from_slice(&self.snonce);

        if !self.r0khid.is_empty() {
            push_element(&mut body, SUBELEM_R0KH_ID, &self.r0khid);
        }
        if let Some(r1khid) = self.r1khid {
            push_element(&mut body, SUBELEM_R1KH_ID, &r1khid);
        }
        if let Some(gtk) = &self.gtk {
            let mut value = Vec::with_capacity(10 + gtk.wrapped_key.len());
            value.push(gtk.key_id & 0x03);
            value.push(0);
            value.extend_from_slice(&gtk.rsc);
            value.extend_from_slice(&gtk.wrapped_key);
            push_element(&mut body, SUBELEM_GTK, &value);
        }
        if let Some(igtk) = &self.igtk {
            let mut value = Vec::with_capacity(9 + igtk.wrapped_key.len());
            value.extend_from_slice(&igtk.key_id.to_le_bytes());
            value.extend_from_slice(&igtk.ipn);
            value.push(igtk.wrapped_key.len() as u8);
            value.extend_from_slice(&igtk.wrapped_key);
            push_element(&mut body, SUBELEM_IGTK, &value);
        }
        if let Some(oci) = self.oci {
            push_element(&mut body, SUBELEM_OCI, &oci);
        }

        let mut out = Vec::with_capacity(2 + body.len());
        push_element(&mut out, IE_TYPE_FAST_BSS_TRANSITION, &body);
        out
    }

    /// The "MIC field zeroed" form of this element's raw bytes, for
    /// feeding into [`crate::ft::mic::calculate_fte_mic`].
    pub fn build_with_zero_mic(&self, kck_len: usize) -> Vec<u8> {
        let mut zeroed = self.clone();
        zeroed.mic = vec![0u8; kck_len];
        zeroed.build(kck_len)
    }
}
