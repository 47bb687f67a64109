//! # wlan-ft-dpp
//!
//! Fast BSS Transition, Wi-Fi Easy Connect (DPP), and PHY rate estimation
//! for an 802.11 station daemon.
//!
//! ## The project is broken down into the following modules:
//! * [`band`] - non-HT/HT/VHT receive rate estimation from capability
//! elements and observed RSSI.
//! * [`crypto`] - the shared hash/HMAC/HKDF/PRF+ dispatch used across
//! the DPP and FT key schedules.
//! * [`dpp`] - Easy Connect bootstrapping, authentication, PKEX and
//! configuration-object exchange.
//! * [`error`] - the single error type shared by every module here.
//! * [`ft`] - Fast BSS Transition: authentication/(re)association frame
//! construction and validation, FT-over-DS, and the pending-attempts
//! state machine.
//! * [`netlink`] - a schema-driven attribute codec modeled on
//! generic-netlink TLV streams, used to decode/encode the nl80211
//! messages this crate's callers exchange with the kernel.
//!
//! None of these modules own a socket, a timer wheel, or a scan cache;
//! each takes the bytes or collaborator traits it needs and returns
//! typed data or a typed [`error::Error`]. Wiring them to an actual
//! netlink socket and event loop is left to the embedding station
//! daemon.

pub mod band;
pub mod crypto;
pub mod dpp;
pub mod error;
pub mod ft;
pub mod netlink;

pub use error::{Error, Result};
