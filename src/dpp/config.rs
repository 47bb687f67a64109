//! DPP configuration-object parse/serialize (EasyConnect 6.4.2 Config
//! Response payload).
//!
//! Grounded on `dpp_parse_configuration_object`, `dpp_parse_akm`,
//! `dpp_parse_extra_options`, `dpp_akm_to_string` and
//! `dpp_configuration_to_json` in the original source. Serialization is
//! hand-written rather than `#[derive(Serialize)]` so the emitted field
//! order matches the original string-builder's output exactly
//! (`wi-fi_tech`, `discovery.ssid`, `cred.akm`/`cred.pass`-or-`psk`,
//! `/net/connman/iwd.send_hostname`/`hidden`) regardless of future
//! struct field reordering.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// AKM suites a configuration object credential may be used with.
    /// The DPP spec draws no distinction between an AKM and its
    /// FT variant, so both map to the same bit here.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AkmSuites: u32 {
        const PSK = 0x01;
        const SAE = 0x02;
    }
}

/// Either half of the mutually-exclusive `cred.pass` / `cred.psk` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// An ASCII passphrase, to be hashed into a PSK by the receiver.
    Passphrase(String),
    /// A 64 hex character pre-shared key.
    Psk(String),
}

/// A parsed (or to-be-serialized) DPP configuration object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DppConfiguration {
    pub ssid: String,
    pub credential: Credential,
    pub akm: AkmSuites,
    pub send_hostname: bool,
    pub hidden: bool,
}

fn parse_akm(akms: &str) -> AkmSuites {
    let mut out = AkmSuites::empty();
    for part in akms.split('+') {
        if part.starts_with("psk") {
            out |= AkmSuites::PSK;
        } else if part.starts_with("sae") {
            out |= AkmSuites::SAE;
        }
    }
    out
}

fn akm_to_string(akm: AkmSuites) -> &'static str {
    // Mirrors dpp_akm_to_string: a single textual AKM is emitted even
    // though multiple bits may be set, favoring SAE when both are present.
    if akm.contains(AkmSuites::SAE) {
        "sae"
    } else {
        "psk"
    }
}

/// Parse a DPP configuration object JSON document.
pub fn parse_configuration_object(json: &str) -> Result<DppConfiguration> {
    let root: Value = serde_json::from_str(json)?;

    let tech = root.get("wi-fi_tech").and_then(Value::as_str).ok_or(Error::BadMessage)?;
    if tech != "infra" {
        return Err(Error::BadMessage);
    }

    let discovery = root.get("discovery").ok_or(Error::BadMessage)?;
    let ssid = discovery.get("ssid").and_then(Value::as_str).ok_or(Error::BadMessage)?;
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(Error::BadMessage);
    }

    let cred = root.get("cred").ok_or(Error::BadMessage)?;
    let akm_str = cred.get("akm").and_then(Value::as_str).ok_or(Error::BadMessage)?;
    let pass = cred.get("pass").and_then(Value::as_str);
    let psk = cred.get("psk").and_then(Value::as_str);

    let credential = match (pass, psk) {
        (Some(p), _) => Credential::Passphrase(p.to_owned()),
        (None, Some(p)) if p.len() == 64 && p.bytes().all(|b| b.is_ascii_hexdigit()) => Credential::Psk(p.to_owned()),
        _ => return Err(Error::BadMessage),
    };

    let akm = parse_akm(akm_str);
    if akm.is_empty() {
        return Err(Error::BadMessage);
    }

    let mut send_hostname = false;
    let mut hidden = false;
    if let Some(extra) = root.get("/net/connman/iwd") {
        if let Some(v) = extra.get("send_hostname") {
            send_hostname = v.as_bool().ok_or(Error::BadMessage)?;
        }
        if let Some(v) = extra.get("hidden") {
            hidden = v.as_bool().ok_or(Error::BadMessage)?;
        }
    }

    Ok(DppConfiguration {
        ssid: ssid.to_owned(),
        credential,
        akm,
        send_hostname,
        hidden,
    })
}

/// A helper struct whose handwritten [`Serialize`] impl enforces the
/// exact key order of the original `dpp_configuration_to_json` builder.
struct CanonicalConfig<'a>(&'a DppConfiguration);

impl<'a> Serialize for CanonicalConfig<'a> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let config = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("wi-fi_tech", "infra")?;

        let mut discovery = serde_json::Map::new();
        discovery.insert("ssid".to_owned(), Value::String(config.ssid.clone()));
        map.serialize_entry("discovery", &discovery)?;

        let mut cred = serde_json::Map::new();
        cred.insert("akm".to_owned(), Value::String(akm_to_string(config.akm).to_owned()));
        match &config.credential {
            Credential::Passphrase(p) => {
                cred.insert("pass".to_owned(), Value::String(p.clone()));
            }
            Credential::Psk(p) => {
                cred.insert("psk".to_owned(), Value::String(p.clone()));
            }
        }
        map.serialize_entry("cred", &cred)?;

        let mut extra = serde_json::Map::new();
        extra.insert("send_hostname".to_owned(), Value::Bool(config.send_hostname));
        extra.insert("hidden".to_owned(), Value::Bool(config.hidden));
        map.serialize_entry("/net/connman/iwd", &extra)?;

        map.end()
    }
}

/// Serialize a configuration object back to JSON, in the canonical
/// field order the original emitter produces.
pub fn configuration_to_json(config: &DppConfiguration) -> String {
    serde_json::to_string(&CanonicalConfig(config)).expect("canonical config always serializes")
}

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE: &str = r#"{
        "wi-fi_tech": "infra",
        "discovery": {"ssid": "TestNetwork"},
        "cred": {"akm": "psk", "pass": "secret12345"},
        "/net/connman/iwd": {"send_hostname": true, "hidden": false}
    }"#;

    #[test]
    fn parses_example_object() {
        let config = parse_configuration_object(EXAMPLE).unwrap();
        assert_eq!(config.ssid, "TestNetwork");
        assert_eq!(config.credential, Credential::Passphrase("secret12345".to_owned()));
        assert_eq!(config.akm, AkmSuites::PSK);
        assert!(config.send_hostname);
        assert!(!config.hidden);
    }

    #[test]
    fn non_ascii_utf8_ssid_is_accepted() {
        let json = r#"{
            "wi-fi_tech": "infra",
            "discovery": {"ssid": "Café"},
            "cred": {"akm": "psk", "pass": "secret12345"}
        }"#;
        let config = parse_configuration_object(json).unwrap();
        assert_eq!(config.ssid, "Café");
    }

    #[test]
    fn round_trips_through_json() {
        let config = parse_configuration_object(EXAMPLE).unwrap();
        let json = configuration_to_json(&config);
        let reparsed = parse_configuration_object(&json).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn canonical_order_is_stable() {
        let config = DppConfiguration {
            ssid: "Net".to_owned(),
            credential: Credential::Psk("a".repeat(64)),
            akm: AkmSuites::SAE,
            send_hostname: false,
            hidden: true,
        };
        let json = configuration_to_json(&config);
        let tech_pos = json.find("wi-fi_tech").unwrap();
        let discovery_pos = json.find("discovery").unwrap();
        let cred_pos = json.find("\"cred\"").unwrap();
        let extra_pos = json.find("/net/connman/iwd").unwrap();
        assert!(tech_pos < discovery_pos);
        assert!(discovery_pos < cred_pos);
        assert!(cred_pos < extra_pos);
    }

    #[test]
    fn rejects_both_pass_and_missing_psk() {
        let bad = r#"{
            "wi-fi_tech": "infra",
            "discovery": {"ssid": "Net"},
            "cred": {"akm": "psk"}
        }"#;
        assert!(parse_configuration_object(bad).is_err());
    }

    #[test]
    fn rejects_empty_akm() {
        let bad = r#"{
            "wi-fi_tech": "infra",
            "discovery": {"ssid": "Net"},
            "cred": {"akm": "unknown", "pass": "secret12345"}
        }"#;
        assert!(parse_configuration_object(bad).is_err());
    }
}
