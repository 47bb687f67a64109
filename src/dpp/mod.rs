//! Wi-Fi Easy Connect (DPP) — bootstrapping, authentication, PKEX, and
//! configuration-object exchange.
//!
//! This module is organized by the derivation families in the original
//! `dpp-util.c`: elliptic-curve primitives ([`ecc`]), the R-auth/I-auth
//! and k1/k2/ke key schedule ([`auth`]), PKEX ([`pkex`]), the flat
//! attribute TLV stream and AES-SIV wrapped data ([`wrapped`]), the
//! configuration JSON object ([`config`]), `SubjectPublicKeyInfo` DER
//! ([`asn1`]), and the bootstrapping URI grammar ([`uri`]).

pub mod asn1;
pub mod auth;
pub mod config;
pub mod ecc;
pub mod pkex;
pub mod uri;
pub mod wrapped;

pub use config::{AkmSuites, Credential, DppConfiguration};
pub use ecc::Curve;
pub use uri::{ChannelSpec, DppUriInfo};
